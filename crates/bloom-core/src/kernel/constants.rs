/// Application name
pub const APP_NAME: &str = "Bloom";

/// Current application version number
pub const APP_VERSION: &str = "1.0.0";

/// Default public subdirectory of the base path
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Configuration directory, relative to the base path
pub const CONFIG_DIR: &str = "config";

/// Environment file name, relative to the base path
pub const ENV_FILE: &str = ".env";

/// Default charset seeded into configuration
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Environment reported when `APP_ENV` is unset
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Enables process-environment precedence over `.env` values
pub const ENV_USE_GLOBAL: &str = "USE_GLOBAL_ENV";

/// Overrides the public subdirectory name
pub const ENV_PUBLIC_DIR: &str = "APP_PUBLIC_DIR";

/// Forces the console-mode answer
pub const ENV_RUNNING_IN_CONSOLE: &str = "APP_RUNNING_IN_CONSOLE";

/// Enables debug behaviour (verbose logs, error details in responses)
pub const ENV_DEBUG: &str = "APP_DEBUG";

/// Application environment name
pub const ENV_APP_ENV: &str = "APP_ENV";

/// Application public URL
pub const ENV_URL: &str = "APP_URL";

/// Application timezone
pub const ENV_TIMEZONE: &str = "APP_TIMEZONE";

/// Set by CGI gateways; its presence means we are serving a web request
pub const ENV_GATEWAY_INTERFACE: &str = "GATEWAY_INTERFACE";
