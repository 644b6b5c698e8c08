use dripflow::{EngineBuilder, FlowModel, RunEvent, TriggerInvocation, store::data, utils};

fn main() {
    tracing_subscriber::fmt::init();

    let engine = EngineBuilder::new().build().unwrap();
    engine.launch();

    let store = engine.store();
    store
        .workspaces()
        .create(&data::Workspace {
            id: "w1".to_string(),
            name: "Acme".to_string(),
            from_email: "hello@acme.test".to_string(),
            from_name: "Acme".to_string(),
            unsubscribe_base_url: None,
            audience_api_key: None,
            audience_server: None,
        })
        .unwrap();
    store
        .contacts()
        .create(&data::Contact {
            id: "c1".to_string(),
            workspace_id: "w1".to_string(),
            email: "ana@example.com".to_string(),
            first_name: "Ana".to_string(),
            marketing_opt_in: true,
            timestamp: utils::time::time_millis(),
        })
        .unwrap();
    // 4000 in completed orders: below the flow's 5000 threshold, so
    // the run takes the false branch and ends without sending email
    store
        .orders()
        .create(&data::Order {
            id: "o1".to_string(),
            contact_id: "c1".to_string(),
            status: data::OrderStatus::Completed,
            total_amount: 4000,
            funnel_id: None,
            items: vec![],
            completed_at: utils::time::time_millis(),
        })
        .unwrap();

    let flow = FlowModel::from_json(include_str!("./flow.json")).unwrap();
    engine.deploy(&flow).unwrap();
    store
        .triggers()
        .create(&data::Trigger {
            id: "trig1".to_string(),
            flow_id: flow.id.clone(),
            kind: "new_contact".to_string(),
            enabled: true,
            timestamp: utils::time::time_millis(),
        })
        .unwrap();

    let mut events = engine.subscribe();
    engine.dispatch(TriggerInvocation::for_contact("trig1", "c1")).unwrap();

    while let Ok(event) = events.blocking_recv() {
        println!("{:?}", event);
        if matches!(
            event,
            RunEvent::Completed {
                ..
            } | RunEvent::Halted {
                ..
            }
        ) {
            break;
        }
    }

    engine.shutdown();
}
