use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::cart::{Cart, ItemId};

/// Lifecycle status of an order. The vocabulary is shared with the kitchen
/// and admin collaborators and must match exactly on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Preparing => Some(1),
            OrderStatus::Ready => Some(2),
            OrderStatus::Completed => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Staff transitions: strictly forward along the kitchen pipeline, or to
    /// `Cancelled` from any non-terminal state.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, _) => false,
        }
    }

    /// The only change a customer may request.
    pub fn customer_can_cancel(self) -> bool {
        self == OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CustomerInfo {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
            address: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.trim().is_empty()
    }

    /// Trims every field and drops blank optional ones.
    pub fn normalized(&self) -> Self {
        fn optional(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: optional(&self.email),
            address: optional(&self.address),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[schema(value_type = i64)]
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub quantity: u32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderRequest {
    pub customer: CustomerInfo,
    pub items: Vec<OrderLineRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderRequest {
    /// Derives one request line per cart line.
    pub fn from_cart(cart: &Cart, customer: &CustomerInfo, notes: Option<&str>) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| OrderLineRequest {
                item_id: line.item_id,
                variant: line.variant.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
                special_requests: line.special_requests.clone(),
            })
            .collect();

        Self {
            customer: customer.normalized(),
            items,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    pub fn total(&self) -> BigDecimal {
        self.items
            .iter()
            .fold(BigDecimal::from(0), |acc, l| {
                acc + &l.unit_price * BigDecimal::from(l.quantity)
            })
    }
}

/// Accepts either a JSON string or integer id.
fn deserialize_order_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(id) => Ok(id),
        RawId::Number(id) => Ok(id.to_string()),
    }
}

/// Reads a status, mapping values outside the shared vocabulary to `None`.
fn deserialize_lenient_status<'de, D>(deserializer: D) -> Result<Option<OrderStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Success body of `POST /orders`. Only the id is required; a created order
/// is a created order whatever else the service chooses to echo back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedOrder {
    #[serde(deserialize_with = "deserialize_order_id")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub total: Option<BigDecimal>,
}

/// Read-only view of a backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(deserialize_with = "deserialize_order_id")]
    pub id: String,
    pub status: OrderStatus,
    #[schema(value_type = String)]
    pub total: BigDecimal,
    pub customer: CustomerInfo,
    pub items: Vec<OrderLineRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_match_vocabulary() {
        let names: Vec<String> = OrderStatus::ALL
            .iter()
            .map(|s| serde_json::to_value(s).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            ["pending", "preparing", "ready", "completed", "cancelled"]
        );
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("confirmed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn staff_transitions_only_move_forward() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Preparing));
        assert!(Pending.can_transition_to(Ready));
        assert!(Preparing.can_transition_to(Completed));
        assert!(Ready.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Preparing));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn customer_may_only_cancel_pending() {
        assert!(OrderStatus::Pending.customer_can_cancel());
        assert!(!OrderStatus::Preparing.customer_can_cancel());
        assert!(!OrderStatus::Cancelled.customer_can_cancel());
    }

    #[test]
    fn required_fields_must_be_non_blank() {
        assert!(CustomerInfo::new("Ana", "555-0101").has_required_fields());
        assert!(!CustomerInfo::new("  ", "555-0101").has_required_fields());
        assert!(!CustomerInfo::new("Ana", "").has_required_fields());
    }

    #[test]
    fn request_is_derived_line_for_line_from_cart() {
        let mut cart = Cart::new();
        cart.add(1, None, "10.00".parse().unwrap(), 2).unwrap();
        cart.add(1, Some("large"), "12.00".parse().unwrap(), 1).unwrap();
        cart.set_special_requests(1, None, Some("well done"));
        let customer = CustomerInfo::new(" Ana ", "555").with_email("  ");

        let request = OrderRequest::from_cart(&cart, &customer, Some(" ring twice "));

        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].special_requests.as_deref(), Some("well done"));
        assert_eq!(request.items[1].variant.as_deref(), Some("large"));
        assert_eq!(request.customer.name, "Ana");
        assert_eq!(request.customer.email, None);
        assert_eq!(request.notes.as_deref(), Some("ring twice"));
        assert_eq!(request.total(), "32.00".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn request_body_uses_contract_field_names() {
        let mut cart = Cart::new();
        cart.add(4, None, "5.50".parse().unwrap(), 3).unwrap();
        let request = OrderRequest::from_cart(&cart, &CustomerInfo::new("Bo", "1"), None);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["customer"]["name"], "Bo");
        assert!(json["customer"].get("email").is_none());
        assert_eq!(json["items"][0]["itemId"], 4);
        assert_eq!(json["items"][0]["quantity"], 3);
        assert_eq!(json["items"][0]["unitPrice"], "5.50");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn created_order_accepts_numeric_or_string_ids() {
        let a: CreatedOrder =
            serde_json::from_str(r#"{"id":"O1","status":"pending","total":"20.00"}"#).unwrap();
        let b: CreatedOrder =
            serde_json::from_str(r#"{"id":42,"status":"pending","total":20.0}"#).unwrap();

        assert_eq!(a.id, "O1");
        assert_eq!(b.id, "42");
        assert_eq!(b.total, Some("20".parse::<BigDecimal>().unwrap()));
    }

    #[test]
    fn created_order_needs_only_an_id() {
        let bare: CreatedOrder = serde_json::from_str(r#"{"id":"O7"}"#).unwrap();
        let odd: CreatedOrder =
            serde_json::from_str(r#"{"id":8,"status":"confirmed","total":null}"#).unwrap();

        assert_eq!(bare.id, "O7");
        assert_eq!(bare.status, None);
        assert_eq!(bare.total, None);
        assert_eq!(odd.id, "8");
        assert_eq!(odd.status, None);
        assert!(serde_json::from_str::<CreatedOrder>(r#"{"status":"pending"}"#).is_err());
    }
}
