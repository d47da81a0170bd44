use super::*;
use crate::notify::NotificationKind;
use tokio::sync::mpsc::Receiver;

mod test_core;

fn create_test_manager() -> (OrderLifecycleManager, Receiver<NotificationJob>) {
    let store = Arc::new(OrderStore::open_in_memory().unwrap());
    let (tx, rx) = mpsc::channel(32);
    (OrderLifecycleManager::new(store, tx, 3, 2), rx)
}

fn item(name: &str, quantity: u32, unit_price: f64) -> OrderItemInput {
    OrderItemInput {
        product_id: format!("prod-{name}"),
        product_name: name.to_string(),
        quantity,
        unit_price,
        subtotal: f64::from(quantity) * unit_price,
    }
}

fn delivery_request() -> CreateOrderRequest {
    let items = vec![item("Arroz 5kg", 2, 25.5), item("Aceite 1L", 1, 12.0)];
    let subtotal: f64 = items.iter().map(|i| i.subtotal).sum();
    CreateOrderRequest {
        customer_name: "Maria Quispe".to_string(),
        customer_email: "maria@example.com".to_string(),
        customer_phone: Some("+51 999 888 777".to_string()),
        shipping_method: ShippingMethod::Delivery,
        shipping_address: Some("Av. Los Pinos 123".to_string()),
        shipping_district: Some("Miraflores".to_string()),
        site_id: None,
        payment_method: "transfer".to_string(),
        requires_payment_proof: true,
        payment_proof_url: Some("https://proofs.test/p1.jpg".to_string()),
        items,
        subtotal,
        shipping_cost: 8.0,
        total: subtotal + 8.0,
    }
}

fn pickup_request() -> CreateOrderRequest {
    CreateOrderRequest {
        shipping_method: ShippingMethod::Pickup,
        shipping_address: None,
        shipping_district: None,
        requires_payment_proof: false,
        payment_proof_url: None,
        ..delivery_request()
    }
}

/// Drain every job currently sitting in the queue
fn drain_jobs(rx: &mut Receiver<NotificationJob>) -> Vec<NotificationJob> {
    let mut jobs = Vec::new();
    while let Ok(job) = rx.try_recv() {
        jobs.push(job);
    }
    jobs
}
