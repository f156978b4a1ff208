//! Order notification emails
//!
//! Sends a confirmation to the customer and a copy to the admin, with the
//! PDF receipt attached. Notifications are strictly best-effort: checkout
//! has already committed by the time this runs, each recipient gets exactly
//! one attempt, and every failure is logged and swallowed here so one bad
//! recipient never blocks another.
//!
//! Without SMTP_HOST the notifier runs disabled and only logs what it
//! would have sent.

use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::core::Config;
use crate::db::models::Order;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to read attachment: {0}")]
    Io(#[from] std::io::Error),

    #[error("Email task failed: {0}")]
    Task(String),
}

/// Order notifier
#[derive(Clone)]
pub enum Notifier {
    Smtp {
        transport: SmtpTransport,
        from: Mailbox,
        admin: Option<Mailbox>,
        shop_name: String,
    },
    /// No SMTP configured; log instead of sending
    Disabled,
}

impl Notifier {
    /// Build from configuration. Any SMTP misconfiguration degrades to the
    /// disabled notifier with a warning instead of failing startup.
    pub fn from_config(config: &Config) -> Self {
        let Some(host) = &config.smtp_host else {
            tracing::info!("SMTP_HOST not set, email notifications disabled");
            return Notifier::Disabled;
        };

        let from: Mailbox = match format!("{} <{}>", config.shop_name, config.email_from).parse() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid EMAIL_FROM, email notifications disabled");
                return Notifier::Disabled;
            }
        };

        let admin = match &config.admin_email {
            Some(addr) => match addr.parse::<Mailbox>() {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid ADMIN_EMAIL, admin copies disabled");
                    None
                }
            },
            None => None,
        };

        let mut builder = match SmtpTransport::relay(host) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "SMTP relay setup failed, email notifications disabled");
                return Notifier::Disabled;
            }
        };
        builder = builder.port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Notifier::Smtp {
            transport: builder.build(),
            from,
            admin,
            shop_name: config.shop_name.clone(),
        }
    }

    /// Send the order confirmation to the customer and the admin copy,
    /// attaching the rendered receipt when one exists. Each recipient gets
    /// one independent attempt; failures are logged, never propagated.
    pub async fn order_confirmation(&self, order: &Order, receipt_pdf: Option<&Path>) {
        let (transport, from, admin, shop_name) = match self {
            Notifier::Smtp {
                transport,
                from,
                admin,
                shop_name,
            } => (transport, from, admin, shop_name),
            Notifier::Disabled => {
                tracing::info!(
                    order_number = %order.number,
                    to = %order.customer.email,
                    "Email disabled, skipping order confirmation"
                );
                return;
            }
        };

        let attachment = receipt_pdf.and_then(|path| {
            match Self::load_attachment(path, &order.number) {
                Ok(att) => Some(att),
                Err(e) => {
                    tracing::warn!(
                        order_number = %order.number,
                        error = %e,
                        "Receipt attachment unreadable, sending without it"
                    );
                    None
                }
            }
        });

        let subject = format!("{} - order {} confirmed", shop_name, order.number);
        let body = Self::order_html(order, shop_name);

        for to in Self::recipients(order, admin.as_ref()) {
            let sent =
                Self::send_one(transport, from, &to, &subject, &body, attachment.as_ref()).await;
            match sent {
                Ok(()) => {
                    tracing::info!(order_number = %order.number, to = %to, "Order confirmation sent")
                }
                Err(e) => {
                    tracing::warn!(order_number = %order.number, to = %to, error = %e, "Order notification failed")
                }
            }
        }
    }

    /// Mailboxes for an order: the customer, then the admin copy. A customer
    /// address that fails to parse is logged and skipped without costing the
    /// remaining recipients their attempt.
    fn recipients(order: &Order, admin: Option<&Mailbox>) -> Vec<Mailbox> {
        let mut recipients = Vec::new();
        match format!("{} <{}>", order.customer.name, order.customer.email).parse::<Mailbox>() {
            Ok(m) => recipients.push(m),
            Err(e) => tracing::warn!(
                order_number = %order.number,
                email = %order.customer.email,
                error = %e,
                "Invalid customer email, skipping customer notification"
            ),
        }
        if let Some(admin) = admin {
            recipients.push(admin.clone());
        }
        recipients
    }

    fn load_attachment(path: &Path, order_number: &str) -> Result<SinglePart, NotifyError> {
        let bytes = std::fs::read(path)?;
        let content_type = ContentType::parse("application/pdf")
            .map_err(|e| NotifyError::Task(e.to_string()))?;
        Ok(Attachment::new(format!("receipt-{order_number}.pdf")).body(bytes, content_type))
    }

    async fn send_one(
        transport: &SmtpTransport,
        from: &Mailbox,
        to: &Mailbox,
        subject: &str,
        body: &str,
        attachment: Option<&SinglePart>,
    ) -> Result<(), NotifyError> {
        let builder = Message::builder()
            .from(from.clone())
            .to(to.clone())
            .subject(subject);

        let html_part = SinglePart::html(body.to_string());
        let email = match attachment {
            Some(att) => builder.multipart(
                MultiPart::mixed()
                    .singlepart(html_part)
                    .singlepart(att.clone()),
            )?,
            None => builder.multipart(MultiPart::mixed().singlepart(html_part))?,
        };

        let transport = transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| NotifyError::Task(e.to_string()))??;
        Ok(())
    }

    fn order_html(order: &Order, shop_name: &str) -> String {
        let mut rows = String::new();
        for item in &order.items {
            rows.push_str(&format!(
                "<tr><td>{} - {}</td><td style=\"text-align:center\">{}</td><td style=\"text-align:right\">{:.2}</td></tr>",
                item.product_name,
                item.option_name,
                item.quantity,
                item.line_total(),
            ));
        }
        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{shop_name}</h2>
    <p>Thank you {name}, your order <b>{number}</b> has been received.</p>
    <table style="width:100%; border-collapse: collapse;">
      <tr><th style="text-align:left">Item</th><th>Qty</th><th style="text-align:right">Total</th></tr>
      {rows}
    </table>
    <p style="text-align:right">
      Subtotal: {subtotal:.2}<br>
      Shipping: {shipping:.2}<br>
      <b>Grand total: {grand:.2}</b>
    </p>
    <p style="color:#666; font-size:13px;">Shipping to: {city}, {street}</p>
  </div>
</body>
</html>"#,
            shop_name = shop_name,
            name = order.customer.name,
            number = order.number,
            rows = rows,
            subtotal = order.totals.subtotal,
            shipping = order.totals.shipping,
            grand = order.totals.grand_total,
            city = order.shipping_address.city,
            street = order.shipping_address.street,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        Customer, LineItem, OrderStatus, PaymentMethod, ShippingAddress, Totals,
    };
    use chrono::Utc;

    fn order() -> Order {
        Order {
            id: "o-1".into(),
            number: "ORD-7".into(),
            owner_key: "guest:g".into(),
            customer: Customer {
                name: "Dana".into(),
                email: "dana@example.com".into(),
            },
            items: vec![LineItem {
                product_id: "p".into(),
                product_name: "Olive oil".into(),
                option_id: "o".into(),
                option_name: "750ml".into(),
                unit_price: 40.0,
                quantity: 2,
                image: None,
            }],
            totals: Totals {
                subtotal: 80.0,
                shipping: 20.0,
                grand_total: 100.0,
            },
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cod,
            transaction_id: None,
            shipping_address: ShippingAddress {
                full_name: "Dana".into(),
                phone: "050".into(),
                city: "Haifa".into(),
                street: "HaNamal 3".into(),
                notes: None,
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_a_no_op() {
        let notifier = Notifier::Disabled;
        notifier.order_confirmation(&order(), None).await;
    }

    #[test]
    fn test_recipients_customer_then_admin() {
        let admin: Mailbox = "Shop <admin@example.com>".parse().unwrap();
        let recipients = Notifier::recipients(&order(), Some(&admin));
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].to_string(), "Dana <dana@example.com>");
        assert_eq!(recipients[1].to_string(), "Shop <admin@example.com>");
    }

    #[test]
    fn test_bad_customer_email_keeps_admin_copy() {
        let mut order = order();
        order.customer.email = "not an email".into();
        let admin: Mailbox = "Shop <admin@example.com>".parse().unwrap();
        let recipients = Notifier::recipients(&order, Some(&admin));
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].to_string(), "Shop <admin@example.com>");
    }

    #[test]
    fn test_no_admin_configured_means_customer_only() {
        let recipients = Notifier::recipients(&order(), None);
        assert_eq!(recipients.len(), 1);
    }

    #[test]
    fn test_order_html_contains_totals_and_items() {
        let html = Notifier::order_html(&order(), "Souk");
        assert!(html.contains("ORD-7"));
        assert!(html.contains("Olive oil"));
        assert!(html.contains("100.00"));
    }
}
