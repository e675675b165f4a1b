// command_line.rs — CLI argument parsing (custom, no clap)
//
// Windows-style /switch and -switch prefixes, value switches (/I:photo.png),
// long switches (--env, --config), trailing - disable (/S-).
// On platforms where '/' starts an absolute path, only '-' introduces a
// switch.

use std::path::PathBuf;

use crate::config::Config;
use crate::ehm::AppError;

// ── Enums ─────────────────────────────────────────────────────────────────────

/// What the run does to each selected directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// set_icon_if_has (or the whole subtree with /S)
    Synchronize,

    /// Show icon state only
    List,

    /// Convert an image to icon.ico next to it, then assign it
    AssignFromImage(PathBuf),

    /// Assign an existing .ico file
    AssignIcon(PathBuf),
}

// ── CommandLine struct ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CommandLine {
    pub recurse:        bool,
    pub keep_going:     bool,
    pub list_only:      bool,
    pub quiet:          bool,
    pub image:          Option<PathBuf>,
    pub icon:           Option<PathBuf>,
    pub directories:    Vec<PathBuf>,
    pub show_env_help:  bool,
    pub show_config:    bool,
    pub show_help:      bool,
    pub switch_prefix:  char,
    pub debug:          bool,
}

impl Default for CommandLine {
    fn default() -> Self {
        CommandLine {
            recurse:       false,
            keep_going:    false,
            list_only:     false,
            quiet:         false,
            image:         None,
            icon:          None,
            directories:   Vec::new(),
            show_env_help: false,
            show_config:   false,
            show_help:     false,
            switch_prefix: '-',
            debug:         false,
        }
    }
}

impl CommandLine {
    /// Parse command-line arguments into a CommandLine struct.
    /// Args should NOT include argv[0] (program name).
    pub fn parse_from<I, S>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = CommandLine::default();
        cmd.parse_into(args)?;
        Ok(cmd)
    }

    /// Parse on top of the current values (e.g. RCICON defaults already
    /// applied with apply_config_defaults).
    pub fn parse_into<I, S>(&mut self, args: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg_ref in args {
            let arg = arg_ref.as_ref();
            let Some(first_char) = arg.chars().next() else {
                continue;
            };

            if !is_switch_prefix(first_char) || arg.len() == 1 {
                // Positional argument (directory)
                self.directories.push(PathBuf::from(arg));
                continue;
            }

            self.switch_prefix = first_char;

            let (switch_arg, is_double_dash) = match arg.strip_prefix("--") {
                Some(rest) if first_char == '-' => (rest, true),
                _ => (&arg[1..], false),
            };

            // Reject single-dash long switches (e.g., -env → error)
            if looks_like_long_switch(switch_arg) && !is_double_dash && first_char == '-' {
                return Err(AppError::InvalidArg(format!("Unknown switch: {arg}")));
            }

            self.handle_switch(switch_arg, arg)?;
        }

        self.validate()
    }

    /// Apply switch defaults from Config (parsed from the RCICON
    /// environment variable).  Call BEFORE parse_into so the command line
    /// wins.
    pub fn apply_config_defaults(&mut self, config: &Config) {
        if let Some(v) = config.recurse    { self.recurse    = v; }
        if let Some(v) = config.keep_going { self.keep_going = v; }
        if let Some(v) = config.list_only  { self.list_only  = v; }
        if let Some(v) = config.quiet      { self.quiet      = v; }
    }

    /// The action selected by the switches.
    pub fn action(&self) -> Action {
        if let Some(image) = &self.image {
            Action::AssignFromImage(image.clone())
        } else if let Some(icon) = &self.icon {
            Action::AssignIcon(icon.clone())
        } else if self.list_only {
            Action::List
        } else {
            Action::Synchronize
        }
    }

    /// Route a switch argument to the appropriate handler.
    fn handle_switch(&mut self, switch_arg: &str, original: &str) -> Result<(), AppError> {
        if looks_like_long_switch(switch_arg) {
            return self.handle_long_switch(switch_arg, original);
        }

        let unknown = || AppError::InvalidArg(format!("Unknown switch: {original}"));

        let ch = switch_arg.chars().next().ok_or_else(unknown)?;
        let rest = &switch_arg[ch.len_utf8()..];

        // Trailing '-' disables; anything else after a boolean switch is an error
        let disable = match rest {
            ""  => false,
            "-" => true,
            _ if matches!(ch.to_ascii_lowercase(), 'i' | 'c') => false,
            _   => return Err(unknown()),
        };

        match ch.to_ascii_lowercase() {
            's' => { self.recurse    = !disable; Ok(()) }
            'k' => { self.keep_going = !disable; Ok(()) }
            'l' => { self.list_only  = !disable; Ok(()) }
            'q' => { self.quiet      = !disable; Ok(()) }
            '?' => { self.show_help  = true;     Ok(()) }
            'i' => { self.image = Some(switch_value(rest, original)?); Ok(()) }
            'c' => { self.icon  = Some(switch_value(rest, original)?); Ok(()) }
            _   => Err(unknown()),
        }
    }

    /// Handle long switches: env, config, debug
    fn handle_long_switch(&mut self, switch_arg: &str, original: &str) -> Result<(), AppError> {
        if switch_arg.eq_ignore_ascii_case("env") {
            self.show_env_help = true;
            Ok(())
        } else if switch_arg.eq_ignore_ascii_case("config") {
            self.show_config = true;
            Ok(())
        } else if switch_arg.eq_ignore_ascii_case("debug") {
            self.debug = true;
            Ok(())
        } else if switch_arg.eq_ignore_ascii_case("help") {
            self.show_help = true;
            Ok(())
        } else {
            Err(AppError::InvalidArg(format!("Unknown switch: {original}")))
        }
    }

    /// Reject combinations that ask for two different actions.
    fn validate(&self) -> Result<(), AppError> {
        let p = self.switch_prefix;

        if self.image.is_some() && self.icon.is_some() {
            return Err(AppError::InvalidArg(format!("{p}I and {p}C cannot be used together")));
        }

        if self.list_only && (self.image.is_some() || self.icon.is_some()) {
            return Err(AppError::InvalidArg(format!("{p}L cannot be combined with {p}I or {p}C")));
        }

        Ok(())
    }
}

/// '-' everywhere, '/' only where it cannot be the start of a path.
fn is_switch_prefix(ch: char) -> bool {
    ch == '-' || (cfg!(windows) && ch == '/')
}

/// 3+ chars without ':' or '-' at position 1
fn looks_like_long_switch(switch_arg: &str) -> bool {
    switch_arg.len() >= 3
        && switch_arg.as_bytes().get(1) != Some(&b':')
        && switch_arg.as_bytes().get(1) != Some(&b'-')
}

/// Value of /I:<path> or /C:<path>.  The colon is required.
fn switch_value(rest: &str, original: &str) -> Result<PathBuf, AppError> {
    match rest.strip_prefix(':') {
        Some(value) if !value.trim().is_empty() => Ok(PathBuf::from(value.trim())),
        _ => Err(AppError::InvalidArg(format!("Missing file name: {original}"))),
    }
}
