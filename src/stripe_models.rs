use serde::Deserialize;

/// A Stripe product (one subscription plan).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Recurring {
    pub interval: String,
    #[serde(default)]
    pub interval_count: Option<u32>,
}

/// A Stripe price. `product` is the product id (prices are never expanded
/// by this client).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Price {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    pub currency: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub recurring: Option<Recurring>,
    pub product: String,
}

impl Price {
    /// Amount in major units with two decimals, e.g. `29.00`.
    pub fn formatted_amount(&self) -> Option<String> {
        self.unit_amount
            .map(|cents| format!("{}.{:02}", cents / 100, (cents % 100).abs()))
    }

    pub fn interval(&self) -> &str {
        self.recurring
            .as_ref()
            .map(|r| r.interval.as_str())
            .unwrap_or("one-time")
    }

    /// `29.00 USD/month`, or `N/A` for metered prices without a unit amount.
    pub fn describe(&self) -> String {
        match self.formatted_amount() {
            Some(amount) => format!(
                "{} {}/{}",
                amount,
                self.currency.to_ascii_uppercase(),
                self.interval()
            ),
            None => "N/A".to_string(),
        }
    }
}

/// Envelope of Stripe list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorDetail {
    pub fn is_authentication(&self) -> bool {
        self.kind.as_deref() == Some("authentication_error")
    }

    /// The message, suffixed with Stripe's machine-readable code when present.
    pub fn describe(&self) -> Option<String> {
        let message = self.message.as_deref()?;
        Some(match &self.code {
            Some(code) => format!("{} [{}]", message, code),
            None => message.to_string(),
        })
    }
}
