// config.rs — RCICON environment variable: switch defaults
//
// The RCICON variable holds ';'-separated switch names, written without a
// prefix (e.g. "S;K" or "S;Q-").  Each recognised entry sets a default that
// the command line can still override.  Bad entries are collected, not
// fatal, and shown by --env / --config.

pub const RCICON_ENV_VAR_NAME: &str = "RCICON";





/// Source of environment variables, so Config can be tested without
/// touching the real process environment.
pub trait EnvironmentProvider {

    ////////////////////////////////////////////////////////////////////////////
    //
    //  get_env_var
    //
    //  Returns the value of the named environment variable, if set.
    //
    ////////////////////////////////////////////////////////////////////////////

    fn get_env_var(&self, name: &str) -> Option<String>;
}





/// Reads the real process environment.
pub struct DefaultEnvironmentProvider;

impl EnvironmentProvider for DefaultEnvironmentProvider {
    fn get_env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}





////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub message:              String,
    pub entry:                String,
    pub invalid_text:         String,
    pub invalid_text_offset:  usize,
}





#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ErrorInfo>,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl ValidationResult
//
//  Returns true if there are any validation errors.
//
////////////////////////////////////////////////////////////////////////////////

impl ValidationResult {
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty()
    }
}





/// Switch defaults read from RCICON.  None means "not mentioned".
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub recurse:       Option<bool>,
    pub keep_going:    Option<bool>,
    pub list_only:     Option<bool>,
    pub quiet:         Option<bool>,
    pub env_value:     Option<String>,
    last_parse_result: ValidationResult,
}





////////////////////////////////////////////////////////////////////////////////
//
//  SWITCH_MAPPINGS
//
//  Table-driven switch dispatch.  Each entry maps a name
//  (case-insensitive) to a boolean value and a field accessor.
//
////////////////////////////////////////////////////////////////////////////////

type SwitchAccessor = fn(&mut Config) -> &mut Option<bool>;

const SWITCH_MAPPINGS: &[(&str, bool, SwitchAccessor)] = &[
    ("s",  true,  |c| &mut c.recurse),
    ("s-", false, |c| &mut c.recurse),
    ("k",  true,  |c| &mut c.keep_going),
    ("k-", false, |c| &mut c.keep_going),
    ("l",  true,  |c| &mut c.list_only),
    ("l-", false, |c| &mut c.list_only),
    ("q",  true,  |c| &mut c.quiet),
    ("q-", false, |c| &mut c.quiet),
];





////////////////////////////////////////////////////////////////////////////////
//
//  impl Config
//
//  Initialization and RCICON parsing.
//
////////////////////////////////////////////////////////////////////////////////

impl Config {

    ////////////////////////////////////////////////////////////////////////////
    //
    //  new
    //
    //  Create a Config with nothing set.  Call initialize() to read RCICON.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn new() -> Self {
        Self::default()
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  initialize
    //
    //  Parse RCICON from the process environment.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn initialize(&mut self) {
        self.initialize_with_provider(&DefaultEnvironmentProvider);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  initialize_with_provider
    //
    //  Parse RCICON from a specific environment provider (for testing).
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn initialize_with_provider(&mut self, provider: &dyn EnvironmentProvider) {
        self.last_parse_result.errors.clear();
        self.env_value = provider.get_env_var(RCICON_ENV_VAR_NAME);

        let Some(env_value) = self.env_value.clone() else {
            return;
        };

        for entry_raw in env_value.split(';') {
            let entry = entry_raw.trim();
            if entry.is_empty() {
                continue;
            }
            self.process_entry(entry);
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  validate_environment_variable
    //
    //  Errors found during the last initialize.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn validate_environment_variable(&self) -> &ValidationResult {
        &self.last_parse_result
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  process_entry
    //
    //  Apply one RCICON entry or record why it was rejected.
    //
    ////////////////////////////////////////////////////////////////////////////

    fn process_entry(&mut self, entry: &str) {
        // Switch prefixes (/, -, --) are not allowed in the env var
        if entry.starts_with('/') || (entry.starts_with('-') && entry.len() > 1) {
            let prefix_len = if entry.starts_with("--") { 2 } else { 1 };
            self.last_parse_result.errors.push(ErrorInfo {
                message:             "Switch prefixes (/, -, --) are not allowed in env var".into(),
                entry:               entry.into(),
                invalid_text:        entry[..prefix_len].into(),
                invalid_text_offset: 0,
            });
            return;
        }

        for &(name, value, accessor) in SWITCH_MAPPINGS {
            if entry.eq_ignore_ascii_case(name) {
                *accessor(self) = Some(value);
                return;
            }
        }

        self.last_parse_result.errors.push(ErrorInfo {
            message:             "Invalid switch (expected S, K, L, or Q)".into(),
            entry:               entry.into(),
            invalid_text:        entry.into(),
            invalid_text_offset: 0,
        });
    }
}





/// Mock environment for unit tests.
#[cfg(test)]
#[derive(Default)]
pub struct MockEnvironmentProvider {
    vars: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MockEnvironmentProvider {
    pub fn with(name: &str, value: &str) -> Self {
        let mut mock = Self::default();
        mock.vars.insert(name.into(), value.into());
        mock
    }
}

#[cfg(test)]
impl EnvironmentProvider for MockEnvironmentProvider {
    fn get_env_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
