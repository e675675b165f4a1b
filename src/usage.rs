// usage.rs — Help screen, env-var help, config display, error display

use std::io::{self, Write};

use crate::config::{Config, RCICON_ENV_VAR_NAME};





////////////////////////////////////////////////////////////////////////////////

pub const VERSION_STRING:    &str = env!("RCICON_VERSION_STRING");
pub const VERSION_YEAR:      &str = env!("RCICON_VERSION_YEAR");
pub const BUILD_TIMESTAMP:   &str = env!("RCICON_BUILD_TIMESTAMP");
pub const FIRST_YEAR:        &str = "2026";

pub const COPYRIGHT:         char = '\u{00A9}';  // ©
pub const OVERLINE:          char = '\u{203E}';  // ‾





////////////////////////////////////////////////////////////////////////////////
//
//  architecture
//
//  Returns the current CPU architecture as a display string.
//
////////////////////////////////////////////////////////////////////////////////

fn architecture() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "aarch64") {
        "ARM64"
    } else if cfg!(target_arch = "x86") {
        "x86"
    } else {
        "unknown"
    }
}





////////////////////////////////////////////////////////////////////////////////

struct SwitchInfo {
    name:        &'static str,
    description: &'static str,
}





const SWITCH_INFOS: &[SwitchInfo] = &[
    SwitchInfo { name: "S", description: "Recurse into subdirectories" },
    SwitchInfo { name: "K", description: "Keep going past directories that fail" },
    SwitchInfo { name: "L", description: "List icon state only, change nothing" },
    SwitchInfo { name: "Q", description: "Quiet: print errors and the summary only" },
];





////////////////////////////////////////////////////////////////////////////////
//
//  is_powershell
//
//  Check whether the current shell is PowerShell.
//
////////////////////////////////////////////////////////////////////////////////

fn is_powershell() -> bool {
    std::env::var("PSModulePath").is_ok()
}





////////////////////////////////////////////////////////////////////////////////
//
//  display_usage
//
//  Display the main usage/help screen.
//
////////////////////////////////////////////////////////////////////////////////

pub fn display_usage(out: &mut dyn Write, prefix: char) -> io::Result<()> {
    let short = if prefix == '-' { "-" } else { "/" };
    let long  = if prefix == '-' { "--" } else { "/" };
    let lpad  = if prefix == '-' { "" } else { " " };

    writeln!(out, "\
RCIcon folder icon manager version {ver} {arch} ({ts})
Copyright {copy} {years} by Robert Elmer

RCICON [{short}S] [{short}K] [{short}L] [{short}Q] [{short}I:image | {short}C:icon.ico] \
[{long}Env] [{long}Config] [{long}Debug] directory [...]

  directory   One or more folders to update.  A folder whose icon.ico is
              present gets that icon; others are left alone.

  {short}S          Include every subdirectory of each folder.
  {short}K          Keep going when a folder fails; report failures at the end.
  {short}L          List each folder's icon state without changing anything.
  {short}Q          Quiet: print errors and the final summary only.
  {short}I:image    Convert image to a 256x256 icon.ico next to it and assign
              it to each folder.
  {short}C:icon     Assign an existing .ico file to each folder.
  {long}Env       {lpad}Displays {RCICON_ENV_VAR_NAME} help, syntax, and current value.
  {long}Config    {lpad}Displays the switch defaults taken from {RCICON_ENV_VAR_NAME}.
  {long}Debug     {lpad}Writes diagnostic logging to stderr.

  Append - to a switch to turn it off (e.g. {short}S-).  Set RUST_LOG for finer
  control over logging.",
        ver  = VERSION_STRING,
        arch = architecture(),
        ts   = BUILD_TIMESTAMP,
        copy = COPYRIGHT,
        years = copyright_years(VERSION_YEAR),
    )
}





////////////////////////////////////////////////////////////////////////////////
//
//  copyright_years
//
//  "2026", or "2026-2028" once the build year moves past the first release.
//
////////////////////////////////////////////////////////////////////////////////

fn copyright_years(build_year: &str) -> String {
    if build_year > FIRST_YEAR {
        format!("{FIRST_YEAR}-{build_year}")
    } else {
        FIRST_YEAR.to_string()
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  display_env_var_help
//
//  Display RCICON environment variable help with syntax, example and the
//  current value.
//
////////////////////////////////////////////////////////////////////////////////

pub fn display_env_var_help(out: &mut dyn Write, config: &Config, prefix: char) -> io::Result<()> {
    let (syntax_cmd, syntax_suffix, example_cmd) = if is_powershell() {
        (
            format!("  $env:{RCICON_ENV_VAR_NAME} = \""),
            "\"",
            format!("  Example: $env:{RCICON_ENV_VAR_NAME} = \"S;K\""),
        )
    } else {
        (
            format!("  set {RCICON_ENV_VAR_NAME} ="),
            "",
            format!("  Example: set {RCICON_ENV_VAR_NAME} = S;K"),
        )
    };

    writeln!(out)?;
    writeln!(out, "Set the {RCICON_ENV_VAR_NAME} environment variable to change the default switches:")?;
    writeln!(out, "{syntax_cmd}<Switch>[-][;...]{syntax_suffix}")?;
    writeln!(out)?;
    writeln!(out, "  <Switch>    A command-line switch, without its prefix:")?;

    for info in SWITCH_INFOS {
        writeln!(out, "                  {}  {}", info.name, info.description)?;
    }

    writeln!(out)?;
    writeln!(out, "              A trailing - turns the switch off.  The command line wins.")?;
    writeln!(out)?;
    writeln!(out, "{example_cmd}")?;
    writeln!(out)?;

    match &config.env_value {
        Some(_) => {
            display_env_var_current_value(out, config)?;
            display_env_var_decoded_settings(out, config)?;
            display_env_var_issues(out, config, prefix, false)
        }
        None => writeln!(out, "  {RCICON_ENV_VAR_NAME} environment variable is not set."),
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  display_current_configuration
//
//  Display the effective switch defaults and where each came from.
//
////////////////////////////////////////////////////////////////////////////////

pub fn display_current_configuration(out: &mut dyn Write, config: &Config, prefix: char) -> io::Result<()> {
    if config.env_value.is_some() {
        display_env_var_issues(out, config, prefix, true)?;
    }

    writeln!(out, "Switch defaults:")?;

    for (info, value) in SWITCH_INFOS.iter().zip(switch_values(config)) {
        let (state, source) = match value {
            Some(true)  => ("on",  "Environment"),
            Some(false) => ("off", "Environment"),
            None        => ("off", "Default"),
        };

        writeln!(out, "  {:<3}{:<42}{:<5}{}", info.name, info.description, state, source)?;
    }

    Ok(())
}





////////////////////////////////////////////////////////////////////////////////
//
//  display_env_var_issues
//
//  Display validation errors from the RCICON env var, with the offending
//  text underlined.
//
////////////////////////////////////////////////////////////////////////////////

pub fn display_env_var_issues(out: &mut dyn Write, config: &Config, prefix: char, show_hint: bool) -> io::Result<()> {
    let long = if prefix == '-' { "--" } else { "/" };

    let result = config.validate_environment_variable();

    if !result.has_issues() {
        return Ok(());
    }

    let hint = if show_hint {
        format!(" (see {}env for help)", long)
    } else {
        String::new()
    };

    writeln!(out)?;
    writeln!(out, "There are some problems with your {} environment variable{}:", RCICON_ENV_VAR_NAME, hint)?;

    for error in &result.errors {
        let prefix_len = 2 + error.message.len() + 5 + error.invalid_text_offset;
        let underline: String = std::iter::repeat_n(OVERLINE, error.invalid_text.chars().count()).collect();

        writeln!(out, "  {} in \"{}\"", error.message, error.entry)?;
        writeln!(out, "{:>width$}{}", "", underline, width = prefix_len)?;
        writeln!(out)?;
    }

    Ok(())
}





////////////////////////////////////////////////////////////////////////////////
//
//  display_env_var_current_value
//
//  Display the raw value of RCICON.
//
////////////////////////////////////////////////////////////////////////////////

fn display_env_var_current_value(out: &mut dyn Write, config: &Config) -> io::Result<()> {
    let Some(env_value) = &config.env_value else {
        return Ok(());
    };

    writeln!(out, "Your settings:")?;
    writeln!(out)?;

    if env_value.is_empty() {
        writeln!(out, "  {RCICON_ENV_VAR_NAME} = <empty>")
    } else {
        writeln!(out, "  {RCICON_ENV_VAR_NAME} = \"{env_value}\"")
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  display_env_var_decoded_settings
//
//  Display the switches RCICON turned on or off.
//
////////////////////////////////////////////////////////////////////////////////

fn display_env_var_decoded_settings(out: &mut dyn Write, config: &Config) -> io::Result<()> {
    let values = switch_values(config);

    if values.iter().all(Option::is_none) {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "    Switches:")?;

    for (info, value) in SWITCH_INFOS.iter().zip(values) {
        match value {
            Some(true)  => writeln!(out, "      {:<3}{}", info.name, info.description)?,
            Some(false) => writeln!(out, "      {:<3}{} (off)", format!("{}-", info.name), info.description)?,
            None        => {}
        }
    }

    Ok(())
}





fn switch_values(config: &Config) -> [Option<bool>; 4] {
    [config.recurse, config.keep_going, config.list_only, config.quiet]
}
