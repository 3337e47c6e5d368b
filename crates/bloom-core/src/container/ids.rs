//! Canonical service identifiers.
//!
//! These are the stable names collaborators bind against. Short aliases such
//! as `config` or `db` resolve to one of these through the alias table.

pub const APPLICATION: &str = "Application";
pub const ASSET_MANAGER: &str = "AssetManager";
pub const CONFIGURATOR: &str = "Configurator";
pub const CONSOLE: &str = "Console";
pub const COOKIE_JAR: &str = "CookieJar";
pub const DATABASE_MANAGER: &str = "DatabaseManager";
pub const DEBUG_MANAGER: &str = "DebugManager";
pub const ENCRYPTER: &str = "Encrypter";
pub const EVENT_DISPATCHER: &str = "EventDispatcher";
pub const FAKER: &str = "Faker";
pub const FIELD_MANAGER: &str = "FieldManager";
pub const FORM_MANAGER: &str = "FormManager";
pub const HTTP_KERNEL: &str = "HttpKernel";
pub const KERNEL: &str = "Kernel";
pub const LOG_MANAGER: &str = "LogManager";
pub const MAIL_MANAGER: &str = "MailManager";
pub const METABOX_MANAGER: &str = "MetaboxManager";
pub const PARTIAL_MANAGER: &str = "PartialManager";
pub const REQUEST: &str = "Request";
pub const RESPONSE_EMITTER: &str = "ResponseEmitter";
pub const ROUTER: &str = "Router";
pub const SESSION_MANAGER: &str = "SessionManager";
pub const STORAGE_MANAGER: &str = "StorageManager";
pub const VALIDATOR: &str = "Validator";
pub const VIEW_MANAGER: &str = "ViewManager";
