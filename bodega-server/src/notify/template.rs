//! Email subject and body composition
//!
//! Plain formatted HTML, one template per notification kind. The store
//! name comes from config so the templates carry no hard-coded branding.

use shared::models::{Order, ShippingMethod};

use super::job::{NotificationJob, NotificationKind};

/// Subject line for a job
pub fn subject(job: &NotificationJob, store_name: &str) -> String {
    let number = &job.order.order_number;
    match job.kind {
        NotificationKind::Confirmation => {
            format!("{store_name} - Hemos recibido tu pedido {number}")
        }
        NotificationKind::Approval => format!("{store_name} - Pedido {number} confirmado"),
        NotificationKind::Rejection => format!("{store_name} - Pedido {number} no procesado"),
        NotificationKind::PaymentVerified => {
            format!("{store_name} - Pago del pedido {number} verificado")
        }
        NotificationKind::StatusUpdate => {
            format!("{store_name} - Actualización del pedido {number}")
        }
    }
}

/// HTML body for a job
pub fn html_body(job: &NotificationJob, store_name: &str) -> String {
    let order = &job.order;
    let mut body = String::new();

    body.push_str(&format!(
        "<h2>Hola {},</h2>",
        escape(&order.customer_name)
    ));

    match job.kind {
        NotificationKind::Confirmation => {
            body.push_str(&format!(
                "<p>Hemos recibido tu pedido <strong>{}</strong> y lo estamos revisando.</p>",
                escape(&order.order_number)
            ));
        }
        NotificationKind::Approval => {
            body.push_str(&format!(
                "<p>Tu pedido <strong>{}</strong> fue confirmado. Adjuntamos tu comprobante.</p>",
                escape(&order.order_number)
            ));
            body.push_str(&delivery_note(order));
        }
        NotificationKind::Rejection => {
            body.push_str(&format!(
                "<p>Lamentablemente no pudimos procesar tu pedido <strong>{}</strong>.</p>",
                escape(&order.order_number)
            ));
            if let Some(reason) = &job.reason {
                body.push_str(&format!("<p>Motivo: {}</p>", escape(reason)));
            }
        }
        NotificationKind::PaymentVerified => {
            body.push_str(&format!(
                "<p>Verificamos el pago de tu pedido <strong>{}</strong>. Ya estamos preparándolo.</p>",
                escape(&order.order_number)
            ));
        }
        NotificationKind::StatusUpdate => {
            body.push_str(&format!(
                "<p>Tu pedido <strong>{}</strong> cambió de estado: <strong>{}</strong>.</p>",
                escape(&order.order_number),
                order.status
            ));
            if let Some(url) = &order.tracking_url {
                body.push_str(&format!(
                    "<p>Puedes seguirlo aquí: <a href=\"{}\">{}</a></p>",
                    escape(url),
                    escape(url)
                ));
            }
        }
    }

    body.push_str(&order_summary(order));
    body.push_str(&format!("<p>Gracias por tu compra,<br>{}</p>", escape(store_name)));
    body
}

fn delivery_note(order: &Order) -> String {
    match order.shipping_method {
        ShippingMethod::Delivery => match order.estimated_delivery {
            Some(eta) => format!(
                "<p>Entrega estimada: <strong>{}</strong>.</p>",
                eta.format("%d/%m/%Y")
            ),
            None => "<p>Te avisaremos cuando salga a reparto.</p>".to_string(),
        },
        ShippingMethod::Pickup => match order.estimated_delivery {
            Some(eta) => format!(
                "<p>Estará listo para recoger el <strong>{}</strong>.</p>",
                eta.format("%d/%m/%Y")
            ),
            None => "<p>Te avisaremos cuando esté listo para recoger.</p>".to_string(),
        },
    }
}

fn order_summary(order: &Order) -> String {
    let mut rows = String::new();
    for item in &order.items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td align=\"center\">{}</td><td align=\"right\">S/ {:.2}</td></tr>",
            escape(&item.product_name),
            item.quantity,
            item.subtotal
        ));
    }
    format!(
        "<table width=\"100%\" cellpadding=\"4\">\
         <tr><th align=\"left\">Producto</th><th>Cant.</th><th align=\"right\">Importe</th></tr>\
         {rows}\
         <tr><td colspan=\"2\" align=\"right\">Envío</td><td align=\"right\">S/ {:.2}</td></tr>\
         <tr><td colspan=\"2\" align=\"right\"><strong>Total</strong></td>\
         <td align=\"right\"><strong>S/ {:.2}</strong></td></tr>\
         </table>",
        order.shipping_cost, order.total
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::{OrderItem, OrderStatus};

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: "o1".to_string(),
            order_number: "WEB202501010001".to_string(),
            customer_name: "Ana <script>".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: None,
            shipping_method: ShippingMethod::Delivery,
            shipping_address: Some("Av. Siempre Viva 123".to_string()),
            shipping_district: None,
            site_id: None,
            payment_method: "cash".to_string(),
            requires_payment_proof: false,
            payment_proof_url: None,
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                product_name: "Arroz 5kg".to_string(),
                quantity: 2,
                unit_price: 25.5,
                subtotal: 51.0,
            }],
            subtotal: 51.0,
            shipping_cost: 8.0,
            total: 59.0,
            status: OrderStatus::Confirmed,
            tracking_url: None,
            estimated_delivery: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_subject_carries_order_number() {
        let job = NotificationJob::new(NotificationKind::Approval, &order(), None);
        let subject = subject(&job, "Bodega Central");
        assert!(subject.contains("WEB202501010001"));
        assert!(subject.contains("Bodega Central"));
    }

    #[test]
    fn test_rejection_includes_reason() {
        let job = NotificationJob::new(
            NotificationKind::Rejection,
            &order(),
            Some("Sin stock".to_string()),
        );
        let html = html_body(&job, "Bodega Central");
        assert!(html.contains("Sin stock"));
    }

    #[test]
    fn test_body_escapes_customer_input() {
        let job = NotificationJob::new(NotificationKind::Confirmation, &order(), None);
        let html = html_body(&job, "Bodega Central");
        assert!(html.contains("Ana &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_summary_totals() {
        let job = NotificationJob::new(NotificationKind::Approval, &order(), None);
        let html = html_body(&job, "Bodega Central");
        assert!(html.contains("S/ 59.00"));
        assert!(html.contains("Arroz 5kg"));
    }
}
