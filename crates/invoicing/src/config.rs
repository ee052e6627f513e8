//! Invoicing configuration (environment driven).

/// Defaults applied when creating invoices and seeding the number issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicingConfig {
    /// Currency code for invoices created without one.
    pub default_currency: String,
    /// Days between issue date and default due date.
    pub payment_terms_days: u32,
    /// First counter value for [`AtomicInvoiceNumberIssuer`](crate::AtomicInvoiceNumberIssuer).
    pub number_start: u64,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            payment_terms_days: 14,
            number_start: 1,
        }
    }
}

impl InvoicingConfig {
    /// Read `BILLFORGE_DEFAULT_CURRENCY`, `BILLFORGE_PAYMENT_TERMS_DAYS` and
    /// `BILLFORGE_NUMBER_START`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Malformed values fall back to the
    /// default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_currency = lookup("BILLFORGE_DEFAULT_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or(defaults.default_currency);

        let payment_terms_days = parse_or(
            &lookup,
            "BILLFORGE_PAYMENT_TERMS_DAYS",
            defaults.payment_terms_days,
        );

        let number_start = match parse_or(&lookup, "BILLFORGE_NUMBER_START", defaults.number_start) {
            0 => {
                tracing::warn!("BILLFORGE_NUMBER_START=0 is not a valid start; using 1");
                1
            }
            n => n,
        };

        Self {
            default_currency,
            payment_terms_days,
            number_start,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("{key}={raw:?} is not valid; using default {default}");
            default
        }
    }
}
