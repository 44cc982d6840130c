// src/constants.rs

/// Built-in variable holding the profile name being targeted.
pub const VAR_PROFILE: &str = "PROFILE";

/// Built-in variable holding the region every command is sent to.
pub const VAR_REGION: &str = "REGION";

/// Built-in variable holding the account id confirmed by the identity check.
pub const VAR_ACCOUNT_ID: &str = "ACCOUNT_ID";

/// Built-in variable holding the identifier of the current run.
pub const VAR_RUN_ID: &str = "RUN_ID";

/// Names that no variable layer and no capture can ever overwrite.
pub const BUILTIN_VARS: &[&str] = &[VAR_PROFILE, VAR_REGION, VAR_ACCOUNT_ID, VAR_RUN_ID];

/// Region used when the configuration does not name one.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Lower bound on closure passes when resolving an environment.
pub const MAX_RESOLVE_PASSES: usize = 20;

/// The external tool every command node is sent to.
pub const TOOL_PROGRAM: &str = "aws";

/// Environment overrides that keep the tool from paging or prompting.
pub const TOOL_ENV_OVERRIDES: &[(&str, &str)] = &[("AWS_PAGER", ""), ("AWS_CLI_AUTO_PROMPT", "off")];

/// Directory (relative to the working directory) that receives one transcript per run.
pub const LOG_DIR: &str = "log";

/// Location of the shared AWS config file, relative to the home directory.
pub const AWS_CONFIG_RELATIVE_PATH: &str = ".aws/config";

/// Returns true if `name` is reserved for a built-in variable.
pub fn is_builtin_var(name: &str) -> bool {
    BUILTIN_VARS.contains(&name)
}
