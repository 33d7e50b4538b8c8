//! Invoice email content.
//!
//! Documents arrive in the document-store JSON shape: snake_case keys, any
//! field may be missing, and amounts may be numbers or numeric strings.
//! Missing or empty values render with the same placeholders the web UI
//! shows ("Client", "N/A", "pending", "invoice").

use std::fmt::Write as _;

use billpost_mime::InlineAsset;
use billpost_mime::encoding::escape_html;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SendError};
use crate::send::OutgoingMessage;

/// Company name used when the settings document has none.
pub const DEFAULT_COMPANY_NAME: &str = "IMAGICITY";

const NOT_AVAILABLE: &str = "N/A";

/// One billed line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    /// What was billed.
    pub description: Option<String>,
    /// Quantity.
    #[serde(deserialize_with = "lenient_number")]
    pub quantity: f64,
    /// Unit rate.
    #[serde(deserialize_with = "lenient_number")]
    pub rate: f64,
    /// Line total.
    #[serde(deserialize_with = "lenient_number")]
    pub amount: f64,
}

/// Invoice document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    /// Human-facing invoice number.
    pub invoice_number: Option<String>,
    /// Issue date as stored.
    pub invoice_date: Option<String>,
    /// Due date as stored.
    pub due_date: Option<String>,
    /// Payment status.
    pub status: Option<String>,
    /// Document kind (invoice, proforma, ...).
    pub invoice_type: Option<String>,
    /// Billed lines.
    pub items: Vec<LineItem>,
    /// Sum of line amounts.
    #[serde(deserialize_with = "lenient_number")]
    pub subtotal: f64,
    /// Central GST.
    #[serde(deserialize_with = "lenient_number")]
    pub cgst: f64,
    /// State GST.
    #[serde(deserialize_with = "lenient_number")]
    pub sgst: f64,
    /// Integrated GST.
    #[serde(deserialize_with = "lenient_number")]
    pub igst: f64,
    /// Amount due.
    #[serde(deserialize_with = "lenient_number")]
    pub total: f64,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Client document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    /// Client name.
    pub name: Option<String>,
    /// Recipient address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// GST identification number.
    pub gstin: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Business settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessSettings {
    /// Company name.
    pub company_name: Option<String>,
    /// Company postal address.
    pub company_address: Option<String>,
    /// Company GST identification number.
    pub company_gstin: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Bank account number.
    pub account_number: Option<String>,
    /// IFSC code of the branch.
    pub ifsc_code: Option<String>,
    /// UPI id.
    pub upi_id: Option<String>,
}

/// Everything needed to email one invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    /// The invoice.
    pub invoice: Invoice,
    /// The billed client.
    pub client: Client,
    /// Sender business settings.
    #[serde(default)]
    pub settings: BusinessSettings,
}

impl InvoiceDocument {
    /// Parses a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Document`] if the JSON does not match.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the client's email address.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Configuration`] if the client has no email.
    pub fn recipient(&self) -> Result<&str> {
        non_empty(self.client.email.as_deref())
            .map(str::trim)
            .ok_or_else(|| SendError::Configuration("client email is missing".to_string()))
    }

    fn company_name(&self) -> &str {
        value_or(self.settings.company_name.as_deref(), DEFAULT_COMPANY_NAME)
    }

    fn invoice_number(&self) -> &str {
        value_or(self.invoice.invoice_number.as_deref(), NOT_AVAILABLE)
    }

    fn client_name(&self) -> &str {
        value_or(self.client.name.as_deref(), "Client")
    }
}

/// Rendered subject and bodies of an invoice email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceEmail {
    /// Subject line.
    pub subject: String,
    /// Plain-text summary.
    pub text: String,
    /// HTML invoice card.
    pub html: String,
}

impl InvoiceEmail {
    /// Renders the email for `document`. With a logo, the HTML header shows
    /// it through its `cid:` URI.
    #[must_use]
    pub fn render(document: &InvoiceDocument, logo: Option<&InlineAsset>) -> Self {
        Self {
            subject: format!(
                "Invoice {} from {}",
                document.invoice_number(),
                document.company_name()
            ),
            text: render_text(document),
            html: render_html(document, logo),
        }
    }

    /// Turns the rendered email into a message for the client.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Configuration`] if the client has no email.
    pub fn into_message(
        self,
        document: &InvoiceDocument,
        logo: Option<InlineAsset>,
    ) -> Result<OutgoingMessage> {
        let mut message =
            OutgoingMessage::new(document.recipient()?, self.subject, self.text).html(self.html);
        if let Some(logo) = logo {
            message = message.inline(logo);
        }
        Ok(message)
    }
}

fn render_text(document: &InvoiceDocument) -> String {
    let invoice = &document.invoice;
    format!(
        "Hi {name},\n\nYour invoice {number} for amount ₹{total:.2} is ready.\n\n\
         Invoice Date: {date}\nDue Date: {due}\n\nThanks,\n{company}",
        name = document.client_name(),
        number = document.invoice_number(),
        total = invoice.total,
        date = value_or(invoice.invoice_date.as_deref(), NOT_AVAILABLE),
        due = value_or(invoice.due_date.as_deref(), NOT_AVAILABLE),
        company = document.company_name(),
    )
}

fn render_html(document: &InvoiceDocument, logo: Option<&InlineAsset>) -> String {
    let invoice = &document.invoice;
    let settings = &document.settings;
    let company = escape_html(document.company_name());
    let company_address = escape_html(value_or(settings.company_address.as_deref(), NOT_AVAILABLE));
    let company_gstin = escape_html(value_or(settings.company_gstin.as_deref(), NOT_AVAILABLE));
    let number = escape_html(document.invoice_number());

    let mut html = String::with_capacity(8 * 1024);
    let _ = write!(
        html,
        "<div style=\"font-family:Arial,sans-serif;background:#f6f8fb;padding:24px;color:#1f2937;\">\n\
         <div style=\"max-width:760px;margin:0 auto;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;overflow:hidden;\">\n\
         <div style=\"background:#111827;color:#ffffff;padding:20px 24px;\">\n\
         <h1 style=\"margin:0;font-size:20px;\">{company}</h1>\n\
         <p style=\"margin:6px 0 0;font-size:13px;opacity:.9;\">Invoice {number}</p>\n"
    );
    if let Some(logo) = logo {
        let _ = writeln!(
            html,
            "<img src=\"{}\" alt=\"{company} logo\" style=\"height:42px;max-width:180px;background:#fff;padding:6px;border-radius:8px;\" />",
            logo.cid_uri()
        );
    }
    html.push_str("</div>\n<div style=\"padding:24px;\">\n");

    let _ = write!(
        html,
        "<p style=\"margin-top:0;\">Hi {},</p>\n<p>Please find your invoice details below.</p>\n",
        escape_html(document.client_name())
    );

    // Summary
    html.push_str("<table style=\"width:100%;border-collapse:collapse;background:#f9fafb;border:1px solid #e5e7eb;margin:14px 0 6px;\">\n");
    for (label, value) in [
        ("Invoice Number", document.invoice_number()),
        ("Invoice Date", value_or(invoice.invoice_date.as_deref(), NOT_AVAILABLE)),
        ("Due Date", value_or(invoice.due_date.as_deref(), NOT_AVAILABLE)),
        ("Status", value_or(invoice.status.as_deref(), "pending")),
        ("Type", value_or(invoice.invoice_type.as_deref(), "invoice")),
    ] {
        let _ = writeln!(
            html,
            "<tr><td style=\"padding:10px;font-weight:600;width:35%;\">{label}</td><td style=\"padding:10px;\">{}</td></tr>",
            escape_html(value)
        );
    }
    html.push_str("</table>\n");

    // Parties
    let _ = write!(
        html,
        "<table role=\"presentation\" style=\"width:100%;border-collapse:separate;border-spacing:12px;margin:16px 0;\">\n<tr>\n\
         <td style=\"vertical-align:top;width:50%;border:1px solid #e5e7eb;border-radius:8px;padding:12px;background:#f9fafb;\">\n\
         <div style=\"font-size:12px;text-transform:uppercase;color:#6b7280;margin-bottom:8px;\">Billed By</div>\n\
         <div style=\"font-weight:700;\">{company}</div>\n\
         <div style=\"margin-top:6px;\">GSTIN: {company_gstin}</div>\n\
         <div style=\"margin-top:6px;line-height:1.4;\">{company_address}</div>\n\
         </td>\n\
         <td style=\"vertical-align:top;width:50%;border:1px solid #e5e7eb;border-radius:8px;padding:12px;background:#f9fafb;\">\n\
         <div style=\"font-size:12px;text-transform:uppercase;color:#6b7280;margin-bottom:8px;\">Billed To</div>\n"
    );
    for line in client_lines(&document.client, document.client_name()) {
        let _ = writeln!(html, "<div>{}</div>", escape_html(&line));
    }
    html.push_str("</td>\n</tr>\n</table>\n");

    // Line items
    html.push_str(
        "<table style=\"width:100%;border-collapse:collapse;border:1px solid #e5e7eb;margin:10px 0 20px;\">\n\
         <thead><tr style=\"background:#f3f4f6;\">\
         <th style=\"padding:10px;text-align:center;width:52px;\">#</th>\
         <th style=\"padding:10px;text-align:left;\">Description</th>\
         <th style=\"padding:10px;text-align:center;\">Qty</th>\
         <th style=\"padding:10px;text-align:right;\">Rate</th>\
         <th style=\"padding:10px;text-align:right;\">Amount</th>\
         </tr></thead>\n<tbody>\n",
    );
    if invoice.items.is_empty() {
        html.push_str("<tr><td colspan=\"5\" style=\"padding:12px;text-align:center;color:#6b7280;\">No line items</td></tr>\n");
    }
    for (index, item) in invoice.items.iter().enumerate() {
        let _ = writeln!(
            html,
            "<tr>\
             <td style=\"padding:10px;border-bottom:1px solid #eee;text-align:center;\">{}</td>\
             <td style=\"padding:10px;border-bottom:1px solid #eee;\">{}</td>\
             <td style=\"padding:10px;border-bottom:1px solid #eee;text-align:center;\">{}</td>\
             <td style=\"padding:10px;border-bottom:1px solid #eee;text-align:right;\">₹{:.2}</td>\
             <td style=\"padding:10px;border-bottom:1px solid #eee;text-align:right;\">₹{:.2}</td>\
             </tr>",
            index + 1,
            escape_html(value_or(item.description.as_deref(), "-")),
            item.quantity,
            item.rate,
            item.amount,
        );
    }
    html.push_str("</tbody>\n</table>\n");

    // Totals
    html.push_str("<table style=\"width:100%;max-width:320px;margin-left:auto;border-collapse:collapse;\">\n");
    for (label, amount) in [
        ("Subtotal", invoice.subtotal),
        ("CGST", invoice.cgst),
        ("SGST", invoice.sgst),
        ("IGST", invoice.igst),
    ] {
        let _ = writeln!(
            html,
            "<tr><td style=\"padding:6px 0;color:#6b7280;\">{label}</td><td style=\"padding:6px 0;text-align:right;\">₹{amount:.2}</td></tr>"
        );
    }
    let _ = writeln!(
        html,
        "<tr><td style=\"padding:10px 0;font-size:16px;font-weight:700;\">Total</td><td style=\"padding:10px 0;text-align:right;font-size:16px;font-weight:700;\">₹{:.2}</td></tr>\n</table>",
        invoice.total
    );

    if let Some(notes) = non_empty(invoice.notes.as_deref()) {
        let _ = writeln!(
            html,
            "<div style=\"margin-top:18px;padding:12px;background:#fff7ed;border:1px solid #fed7aa;border-radius:8px;\">\
             <div style=\"font-weight:700;margin-bottom:4px;\">Notes</div><div>{}</div></div>",
            escape_html(notes)
        );
    }

    let _ = write!(
        html,
        "<div style=\"margin-top:24px;padding:14px;border:1px dashed #d1d5db;border-radius:8px;background:#fafafa;\">\n\
         <div style=\"font-weight:700;margin-bottom:6px;\">Payment Details</div>\n\
         <div>Bank: {}</div>\n<div>Account Number: {}</div>\n<div>IFSC: {}</div>\n<div>UPI: {}</div>\n\
         </div>\n",
        escape_html(value_or(settings.bank_name.as_deref(), NOT_AVAILABLE)),
        escape_html(value_or(settings.account_number.as_deref(), NOT_AVAILABLE)),
        escape_html(value_or(settings.ifsc_code.as_deref(), NOT_AVAILABLE)),
        escape_html(value_or(settings.upi_id.as_deref(), NOT_AVAILABLE)),
    );

    let _ = write!(
        html,
        "<div style=\"margin-top:24px;padding-top:14px;border-top:1px solid #e5e7eb;font-size:12px;color:#6b7280;line-height:1.5;\">\n\
         <div style=\"font-weight:700;color:#374151;\">{company}</div>\n\
         <div>{company_address}</div>\n\
         <div>GSTIN: {company_gstin}</div>\n\
         <div style=\"margin-top:8px;\">Thank you for your business.</div>\n\
         </div>\n</div>\n</div>\n</div>"
    );

    html
}

fn client_lines(client: &Client, name: &str) -> Vec<String> {
    let mut lines = vec![name.to_string()];
    if let Some(email) = non_empty(client.email.as_deref()) {
        lines.push(format!("Email: {email}"));
    }
    if let Some(phone) = non_empty(client.phone.as_deref()) {
        lines.push(format!("Phone: {phone}"));
    }
    if let Some(gstin) = non_empty(client.gstin.as_deref()) {
        lines.push(format!("GSTIN: {gstin}"));
    }
    if let Some(address) = non_empty(client.address.as_deref()) {
        lines.push(address.to_string());
    }
    lines
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn value_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    non_empty(value).unwrap_or(default)
}

/// Accepts a number, a numeric string, or null; anything unparseable is 0.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(#[allow(dead_code)] serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n.is_finite() => n,
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    })
}
