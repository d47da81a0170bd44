use super::*;
use chrono::Duration;

#[test]
fn test_create_order_starts_pending_with_estimate() {
    let (manager, mut rx) = create_test_manager();

    let order = manager.create_order(delivery_request()).unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.order_number.starts_with("WEB"));
    let eta = order.estimated_delivery.unwrap();
    assert_eq!(eta, order.created_at + Duration::days(3));

    let jobs = drain_jobs(&mut rx);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, NotificationKind::Confirmation);
    assert!(jobs[0].attachment_name.is_none());
}

#[test]
fn test_pickup_order_uses_pickup_lead_time() {
    let (manager, _rx) = create_test_manager();

    let order = manager.create_order(pickup_request()).unwrap();

    let eta = order.estimated_delivery.unwrap();
    assert_eq!(eta, order.created_at + Duration::days(2));
}

#[test]
fn test_order_numbers_are_unique_and_sequential() {
    let (manager, _rx) = create_test_manager();

    let orders: Vec<_> = (0..3)
        .map(|_| manager.create_order(delivery_request()).unwrap())
        .collect();

    assert!(orders[1].order_number.ends_with("0002"));
    assert!(orders[2].order_number.ends_with("0003"));
    // Every number stays bound to its own order in the index
    for order in &orders {
        assert_eq!(
            manager
                .find_by_number(&order.order_number)
                .unwrap()
                .unwrap()
                .id,
            order.id
        );
    }
}

#[test]
fn test_create_rejects_empty_items() {
    let (manager, mut rx) = create_test_manager();

    let mut request = delivery_request();
    request.items.clear();
    request.subtotal = 0.0;
    request.total = 8.0;

    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::EmptyOrder)
    ));
    assert!(drain_jobs(&mut rx).is_empty());
}

#[test]
fn test_create_rejects_bad_money() {
    let (manager, _rx) = create_test_manager();

    let mut request = delivery_request();
    request.items[0].subtotal += 1.0;
    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::TotalMismatch(_))
    ));

    let mut request = delivery_request();
    request.total += 0.5;
    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::TotalMismatch(_))
    ));

    let mut request = delivery_request();
    request.items[0].quantity = 0;
    request.items[0].subtotal = 0.0;
    let items_total: f64 = request.items.iter().map(|i| i.subtotal).sum();
    request.subtotal = items_total;
    request.total = items_total + request.shipping_cost;
    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::Validation(_))
    ));
}

#[test]
fn test_create_rejects_invalid_email_and_missing_address() {
    let (manager, _rx) = create_test_manager();

    let mut request = delivery_request();
    request.customer_email = "not-an-email".to_string();
    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::Validation(_))
    ));

    let mut request = delivery_request();
    request.shipping_address = None;
    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::Validation(_))
    ));
}

#[test]
fn test_over_long_text_fields_are_rejected() {
    let (manager, _rx) = create_test_manager();

    let mut request = delivery_request();
    request.customer_name = "x".repeat(201);
    assert!(matches!(
        manager.create_order(request),
        Err(LifecycleError::Validation(_))
    ));

    let order = manager.create_order(delivery_request()).unwrap();
    assert!(matches!(
        manager.reject(&order.id, &"x".repeat(501)),
        Err(LifecycleError::Validation(_))
    ));

    manager.approve(&order.id, false).unwrap();
    let update = StatusUpdate {
        status: "shipped".to_string(),
        tracking_url: Some(format!("https://track.example/{}", "x".repeat(2048))),
        estimated_delivery: None,
    };
    assert!(matches!(
        manager.update_status(&order.id, update),
        Err(LifecycleError::Validation(_))
    ));

    let pickup = manager.create_order(pickup_request()).unwrap();
    manager.approve(&pickup.id, false).unwrap();
    manager
        .update_status(
            &pickup.id,
            StatusUpdate {
                status: "ready_for_pickup".to_string(),
                tracking_url: None,
                estimated_delivery: None,
            },
        )
        .unwrap();
    let feedback = PickupFeedback {
        rating: 5,
        comment: Some("x".repeat(501)),
        recommend: true,
    };
    assert!(matches!(
        manager.mark_picked_up(&pickup.id, feedback),
        Err(LifecycleError::Validation(_))
    ));
}

#[test]
fn test_approve_moves_pending_to_confirmed() {
    let (manager, mut rx) = create_test_manager();
    let order = manager.create_order(delivery_request()).unwrap();
    drain_jobs(&mut rx);

    let approved = manager.approve(&order.id, false).unwrap();

    assert_eq!(approved.status, OrderStatus::Confirmed);
    assert!(approved.updated_at >= order.updated_at);
    assert_eq!(
        manager.get_order(&order.id).unwrap().status,
        OrderStatus::Confirmed
    );

    let jobs = drain_jobs(&mut rx);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, NotificationKind::Approval);
    assert_eq!(
        jobs[0].attachment_name.as_deref(),
        Some(format!("receipt-{}.pdf", order.order_number).as_str())
    );
}

#[test]
fn test_approve_twice_fails_and_state_sticks() {
    let (manager, mut rx) = create_test_manager();
    let order = manager.create_order(delivery_request()).unwrap();
    manager.approve(&order.id, false).unwrap();
    drain_jobs(&mut rx);

    let err = manager.approve(&order.id, false).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidState {
            current: OrderStatus::Confirmed,
            ..
        }
    ));
    assert_eq!(
        manager.get_order(&order.id).unwrap().status,
        OrderStatus::Confirmed
    );
    // No side effect was scheduled for the failed attempt
    assert!(drain_jobs(&mut rx).is_empty());
}

#[test]
fn test_approve_with_payment_verified_sends_two_notifications() {
    let (manager, mut rx) = create_test_manager();
    let order = manager.create_order(delivery_request()).unwrap();
    drain_jobs(&mut rx);

    manager.approve(&order.id, true).unwrap();

    let kinds: Vec<_> = drain_jobs(&mut rx).into_iter().map(|j| j.kind).collect();
    assert_eq!(
        kinds,
        vec![NotificationKind::Approval, NotificationKind::PaymentVerified]
    );
}

#[test]
fn test_payment_verified_skipped_without_proof_on_file() {
    let (manager, mut rx) = create_test_manager();
    let mut request = delivery_request();
    request.payment_proof_url = None;
    let order = manager.create_order(request).unwrap();
    drain_jobs(&mut rx);

    manager.approve(&order.id, true).unwrap();

    let kinds: Vec<_> = drain_jobs(&mut rx).into_iter().map(|j| j.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Approval]);
}

#[test]
fn test_reject_requires_reason() {
    let (manager, mut rx) = create_test_manager();
    let order = manager.create_order(delivery_request()).unwrap();
    drain_jobs(&mut rx);

    for reason in ["", "   ", "\t\n"] {
        let err = manager.reject(&order.id, reason).unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }
    // Failed validations never touched the order
    assert_eq!(
        manager.get_order(&order.id).unwrap().status,
        OrderStatus::Pending
    );
    assert!(drain_jobs(&mut rx).is_empty());
}

#[test]
fn test_reject_moves_pending_to_cancelled() {
    let (manager, mut rx) = create_test_manager();
    let order = manager.create_order(delivery_request()).unwrap();
    drain_jobs(&mut rx);

    let rejected = manager.reject(&order.id, "Producto sin stock").unwrap();

    assert_eq!(rejected.status, OrderStatus::Cancelled);
    let jobs = drain_jobs(&mut rx);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, NotificationKind::Rejection);
    assert_eq!(jobs[0].reason.as_deref(), Some("Producto sin stock"));
    assert!(jobs[0].attachment_name.is_some());
}

#[test]
fn test_approve_and_reject_fail_on_non_pending() {
    let (manager, mut rx) = create_test_manager();
    let order = manager.create_order(delivery_request()).unwrap();
    manager.reject(&order.id, "duplicado").unwrap();
    drain_jobs(&mut rx);

    assert!(matches!(
        manager.approve(&order.id, false),
        Err(LifecycleError::InvalidState { .. })
    ));
    assert!(matches!(
        manager.reject(&order.id, "otra vez"),
        Err(LifecycleError::InvalidState { .. })
    ));
    assert!(drain_jobs(&mut rx).is_empty());
}

#[test]
fn test_unknown_order_id() {
    let (manager, _rx) = create_test_manager();
    assert!(matches!(
        manager.approve("missing", false),
        Err(LifecycleError::OrderNotFound(_))
    ));
    assert!(matches!(
        manager.get_order("missing"),
        Err(LifecycleError::OrderNotFound(_))
    ));
}
