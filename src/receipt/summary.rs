//! Receipt payload types and summary rendering
//!
//! The OCR service returns a loosely-specified JSON document; field names
//! vary by receipt, so several keys carry aliases.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Status of a scan job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Done,
    Failed,
    #[serde(other)]
    Unknown,
}

/// One poll response from the result endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPayload {
    pub status: ScanStatus,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<Receipt>,
}

/// Parsed receipt fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Receipt {
    pub establishment: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "dateISO")]
    pub date_iso: Option<String>,
    pub total: Option<f64>,
    pub sub_total: Option<f64>,
    pub tax: Option<f64>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "line_items", alias = "items")]
    pub line_items: Vec<LineItem>,
}

/// One itemised row on a receipt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineItem {
    #[serde(alias = "description", alias = "text")]
    pub desc: Option<String>,
    pub qty: Option<f64>,
    pub price: Option<f64>,
    #[serde(alias = "total")]
    pub line_total: Option<f64>,
}

impl Receipt {
    /// Render the common fields plus line items as a printable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let currency = self.currency.as_deref().unwrap_or("");
        let date = self.date.as_deref().or(self.date_iso.as_deref());

        out.push_str("=== RECEIPT SUMMARY ===\n");
        let _ = writeln!(
            out,
            "Merchant: {}",
            self.establishment.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "Date:     {}", date.unwrap_or("-"));
        match self.total {
            Some(total) => {
                let _ = writeln!(out, "Total:    {}", format!("{} {}", total, currency).trim());
            }
            None => out.push_str("Total:    -\n"),
        }
        if let Some(sub_total) = self.sub_total {
            let _ = writeln!(
                out,
                "SubTotal: {}",
                format!("{} {}", sub_total, currency).trim()
            );
        }
        if let Some(tax) = self.tax {
            let _ = writeln!(out, "Tax:      {}", format!("{} {}", tax, currency).trim());
        }
        if let Some(payment) = &self.payment_method {
            let _ = writeln!(out, "Payment:  {}", payment);
        }
        if let Some(address) = &self.address {
            let _ = writeln!(out, "Address:  {}", address);
        }

        if self.line_items.is_empty() {
            out.push_str("\n(No line items detected, or receipt didn't include itemised rows.)\n");
        } else {
            out.push_str("\n=== LINE ITEMS ===\n");
            for (i, item) in self.line_items.iter().enumerate() {
                let _ = writeln!(out, "{:02}. {}", i + 1, item.desc.as_deref().unwrap_or(""));
                let mut bits = Vec::new();
                if let Some(qty) = item.qty {
                    bits.push(format!("qty={}", qty));
                }
                if let Some(price) = item.price {
                    bits.push(format!("price={}", price));
                }
                if let Some(line_total) = item.line_total {
                    bits.push(format!("lineTotal={}", line_total));
                }
                if !bits.is_empty() {
                    let _ = writeln!(out, "    {}", bits.join(", "));
                }
            }
        }

        out
    }
}
