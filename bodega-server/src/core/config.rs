use shared::models::StoreInfo;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/bodega | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | DELIVERY_LEAD_DAYS | 3 | Estimated delivery lead time |
/// | PICKUP_LEAD_DAYS | 2 | Estimated pickup lead time |
/// | ASSETS_DIR | {WORK_DIR}/assets | Static assets root (logo lookup) |
/// | TEMP_DIR | system temp | Rendered receipt output directory |
/// | CLEANUP_DELAY_SECS | 300 | Delay before temp receipts are deleted |
/// | JOB_DEADLINE_SECS | 120 | Overall deadline per notification job |
/// | NOTIFY_QUEUE_CAPACITY | 256 | Bounded notification queue size |
/// | SMTP_HOST / SMTP_PORT | - / 587 | Primary mail transport |
/// | SMTP_USERNAME / SMTP_PASSWORD | - | Primary transport credentials |
/// | MAIL_FROM | - | Sender address |
/// | MAIL_API_URL / MAIL_API_KEY | - | Fallback HTTP email API |
/// | STORE_NAME / STORE_RUC / ... | - | Branding (see [`StoreInfo`]) |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/bodega HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the order database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Order lifecycle ===
    /// Estimated lead time for delivery orders (days)
    pub delivery_lead_days: i64,
    /// Estimated lead time for pickup orders (days)
    pub pickup_lead_days: i64,

    // === Notification pipeline ===
    /// Mail transport settings (primary + fallback)
    pub mail: MailConfig,
    /// Bounded notification queue capacity
    pub notify_queue_capacity: usize,
    /// Overall deadline per notification job (render + send)
    pub job_deadline: Duration,

    // === Documents ===
    /// Static assets root (relative logo paths resolve against this)
    pub assets_dir: PathBuf,
    /// Output directory for rendered receipts
    pub temp_dir: PathBuf,
    /// Delay before a rendered receipt is deleted
    pub cleanup_delay: Duration,
    /// Per-document-kind template toggles
    pub templates: TemplateFlags,

    // === Branding ===
    /// Store identity used on receipts and in emails
    pub store: StoreInfo,
}

/// Mail transport settings
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    /// SMTP relay host (primary channel)
    pub smtp_host: Option<String>,
    /// SMTP port (STARTTLS)
    pub smtp_port: u16,
    /// SMTP credentials; both absent means the primary channel is skipped
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Sender address ("Store <orders@store.example>")
    pub from_address: String,
    /// Fallback HTTP email API endpoint
    pub api_url: Option<String>,
    /// Fallback API key; absent means no fallback channel
    pub api_key: Option<String>,
}

/// Per-document-kind template toggles
///
/// A disabled kind refuses to render before any layout work happens.
#[derive(Debug, Clone)]
pub struct TemplateFlags {
    pub order_receipt: bool,
    pub sale_receipt: bool,
    pub cash_closure: bool,
    pub template_preview: bool,
}

impl Default for TemplateFlags {
    fn default() -> Self {
        Self {
            order_receipt: true,
            sale_receipt: true,
            cash_closure: true,
            template_preview: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/bodega".into());
        let assets_dir = std::env::var("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&work_dir).join("assets"));
        let temp_dir = std::env::var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        Self {
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            delivery_lead_days: env_parse("DELIVERY_LEAD_DAYS", 3),
            pickup_lead_days: env_parse("PICKUP_LEAD_DAYS", 2),

            mail: MailConfig {
                smtp_host: std::env::var("SMTP_HOST").ok(),
                smtp_port: env_parse("SMTP_PORT", 587),
                smtp_username: std::env::var("SMTP_USERNAME").ok(),
                smtp_password: std::env::var("SMTP_PASSWORD").ok(),
                from_address: std::env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "Bodega <no-reply@localhost>".into()),
                api_url: std::env::var("MAIL_API_URL").ok(),
                api_key: std::env::var("MAIL_API_KEY").ok(),
            },
            notify_queue_capacity: env_parse("NOTIFY_QUEUE_CAPACITY", 256),
            job_deadline: Duration::from_secs(env_parse("JOB_DEADLINE_SECS", 120)),

            assets_dir,
            temp_dir,
            cleanup_delay: Duration::from_secs(env_parse("CLEANUP_DELAY_SECS", 300)),
            templates: TemplateFlags {
                order_receipt: env_parse("TEMPLATE_ORDER_RECEIPT", true),
                sale_receipt: env_parse("TEMPLATE_SALE_RECEIPT", true),
                cash_closure: env_parse("TEMPLATE_CASH_CLOSURE", true),
                template_preview: env_parse("TEMPLATE_PREVIEW", true),
            },

            store: StoreInfo {
                name: std::env::var("STORE_NAME").unwrap_or_else(|_| "Bodega".into()),
                ruc: std::env::var("STORE_RUC").unwrap_or_default(),
                address: std::env::var("STORE_ADDRESS").unwrap_or_default(),
                phone: std::env::var("STORE_PHONE").ok(),
                email: std::env::var("STORE_EMAIL").ok(),
                logo: std::env::var("STORE_LOGO").ok(),
                accent_color: std::env::var("STORE_ACCENT_COLOR").ok(),
            },

            work_dir,
        }
    }

    /// Lead time in days for the given shipping method
    pub fn lead_days(&self, method: shared::models::ShippingMethod) -> i64 {
        match method {
            shared::models::ShippingMethod::Delivery => self.delivery_lead_days,
            shared::models::ShippingMethod::Pickup => self.pickup_lead_days,
        }
    }

    /// Whether this is a production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether this is a development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
