// 📐 Shape Layer - Form Validation
// Turns raw form fields into validated inserts, or per-field errors

use crate::entities::{format_percentage, Category, CollectibleStatus, InvoiceStatus, NewCollectible, NewInvoice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// What a form shows after a failed submit: field errors plus a summary line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormState {
    pub errors: BTreeMap<String, Vec<String>>,
    pub message: Option<String>,
}

impl FormState {
    pub fn from_errors(errors: Vec<ValidationError>, message: impl Into<String>) -> Self {
        let mut state = FormState {
            errors: BTreeMap::new(),
            message: Some(message.into()),
        };
        for error in errors {
            state.errors.entry(error.field.to_string()).or_default().push(error.message);
        }
        state
    }

    /// Summary message only, e.g. a database failure
    pub fn message(message: impl Into<String>) -> Self {
        FormState {
            errors: BTreeMap::new(),
            message: Some(message.into()),
        }
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.message.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Update,
}

impl FormAction {
    pub fn verb(&self) -> &'static str {
        match self {
            FormAction::Create => "Create",
            FormAction::Update => "Update",
        }
    }
}

// ============================================================================
// COLLECTIBLES
// ============================================================================

/// Raw collectible form fields as posted by the browser
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CollectibleForm {
    pub name: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub percentage: Option<String>,
}

impl CollectibleForm {
    /// Pre-filled edit form for an existing row
    pub fn from_item(item: &crate::entities::Collectible) -> Self {
        CollectibleForm {
            name: Some(item.name.clone()),
            status: Some(item.status.as_str().to_string()),
            notes: Some(item.notes.clone()),
            percentage: Some(item.percentage.to_string()),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_collectible(
    category: Category,
    form: &CollectibleForm,
    action: FormAction,
) -> Result<NewCollectible, FormState> {
    let mut errors = Vec::new();

    let name = non_blank(&form.name);
    if name.is_none() {
        errors.push(ValidationError::new("name", category.name_required_message()));
    }

    let status = non_blank(&form.status).and_then(|s| CollectibleStatus::from_str(s).ok());
    if status.is_none() {
        errors.push(ValidationError::new("status", category.status_required_message()));
    }

    let percentage = match non_blank(&form.percentage) {
        None => Some(category.default_percentage()),
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                if value < category.min_percentage() {
                    errors.push(ValidationError::new(
                        "percentage",
                        format!(
                            "Percentage must be at least {}.",
                            format_percentage(category.min_percentage())
                        ),
                    ));
                    None
                } else {
                    Some(value)
                }
            }
            _ => {
                errors.push(ValidationError::new("percentage", "Expected number."));
                None
            }
        },
    };

    match (name, status, percentage) {
        (Some(name), Some(status), Some(percentage)) if errors.is_empty() => Ok(NewCollectible {
            name: name.to_string(),
            status,
            notes: form.notes.as_deref().map(str::trim).unwrap_or_default().to_string(),
            percentage,
        }),
        _ => Err(FormState::from_errors(
            errors,
            format!("Missing Fields. Failed to {} {}.", action.verb(), category.singular()),
        )),
    }
}

// ============================================================================
// INVOICES
// ============================================================================

/// Raw invoice form fields; amount is in dollars
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InvoiceFormInput {
    #[serde(rename = "customerId")]
    pub customer_id: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
}

impl InvoiceFormInput {
    pub fn from_invoice(invoice: &crate::entities::InvoiceForm) -> Self {
        InvoiceFormInput {
            customer_id: Some(invoice.customer_id.clone()),
            amount: Some(format!("{:.2}", invoice.amount)),
            status: Some(invoice.status.as_str().to_string()),
        }
    }
}

pub fn validate_invoice(form: &InvoiceFormInput, action: FormAction) -> Result<NewInvoice, FormState> {
    let mut errors = Vec::new();

    let customer_id = non_blank(&form.customer_id);
    if customer_id.is_none() {
        errors.push(ValidationError::new("customerId", "Please select a customer."));
    }

    let amount_cents = non_blank(&form.amount)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .map(|amount| (amount * 100.0).round() as i64);
    if amount_cents.is_none() {
        errors.push(ValidationError::new("amount", "Please enter an amount greater than $0."));
    }

    let status = non_blank(&form.status).and_then(|s| InvoiceStatus::from_str(s).ok());
    if status.is_none() {
        errors.push(ValidationError::new("status", "Please select an invoice status."));
    }

    match (customer_id, amount_cents, status) {
        (Some(customer_id), Some(amount_cents), Some(status)) => Ok(NewInvoice {
            customer_id: customer_id.to_string(),
            amount_cents,
            status,
        }),
        _ => Err(FormState::from_errors(
            errors,
            format!("Missing Fields. Failed to {} Invoice.", action.verb()),
        )),
    }
}

// ============================================================================
// LOGIN
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

impl LoginForm {
    /// Email and password, when both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let email = non_blank(&self.email)?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((email, password))
    }
}

// ============================================================================
// TESTS
// ============================================================================
