//! End-to-end runs through the dispatcher, interpreter and executor
//! against the in-memory store.

mod common;

use common::{TestWorld, action, boolean_edge, edge, flow};

use dripflow::{
    ActionKind, BooleanBranch, ConditionConfig, TriggerInvocation, WaitUnit,
    store::data::{DeliveryStatus, OrderStatus, RunStatus, StepStatus, TemplateKind},
};
use serde_json::json;

fn branching_drip_flow() -> dripflow::FlowModel {
    // t1 -> test(total >= 5000) -true-> wait 1 minute -> send tpl1
    //                           -false-> end
    flow(
        vec![
            action("test", ActionKind::BooleanTest {
                condition: Some(ConditionConfig::HasOrderedAtLeast {
                    amount: Some(json!(5000)),
                }),
            }),
            action("wait", ActionKind::Wait {
                duration: 1,
                unit: WaitUnit::Minutes,
            }),
            action("send", ActionKind::SendEmail {
                template_id: "tpl1".to_string(),
            }),
            action("end", ActionKind::Empty),
        ],
        vec![
            edge("e1", "t1", "test"),
            boolean_edge("e2", "test", "wait", BooleanBranch::True),
            boolean_edge("e3", "test", "end", BooleanBranch::False),
            edge("e4", "wait", "send"),
        ],
    )
}

#[tokio::test]
async fn run_follows_true_branch_through_wait_and_send() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_order("o1", "c1", OrderStatus::Completed, 2000);
    world.seed_order("o2", "c1", OrderStatus::Completed, 3500);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    world.deploy(&branching_drip_flow(), "new_contact");

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let runs = world.runs();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.contact_id.as_deref(), Some("c1"));
    assert!(run.end_time > 0);

    let steps = world.steps_of(&run.id);
    let visited: Vec<&str> = steps.iter().map(|s| s.action_id.as_str()).collect();
    assert_eq!(visited, ["test", "wait", "send"]);
    assert!(steps.iter().all(|s| s.status == StepStatus::Completed));

    // the wait node suspended for one minute through the scheduler
    let suspensions = world.scheduler.suspensions.lock().unwrap();
    assert_eq!(suspensions.len(), 1);
    assert_eq!(suspensions[0].1.as_secs(), 60);

    assert_eq!(world.email.sent_count(), 1);
    let deliveries = world.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].status, DeliveryStatus::Sent);
    assert_eq!(deliveries[0].template_id, "tpl1");
}

#[tokio::test]
async fn run_follows_false_branch_when_threshold_not_met() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    // refunded order does not count toward the threshold
    world.seed_order("o1", "c1", OrderStatus::Completed, 4000);
    world.seed_order("o2", "c1", OrderStatus::Refunded, 90_000);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    world.deploy(&branching_drip_flow(), "new_contact");

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let run = &world.runs()[0];
    assert_eq!(run.status, RunStatus::Completed);
    let visited: Vec<String> = world.steps_of(&run.id).into_iter().map(|s| s.action_id).collect();
    assert_eq!(visited, ["test", "end"]);
    assert_eq!(world.email.sent_count(), 0);
}

#[tokio::test]
async fn second_firing_for_same_contact_is_dropped() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    world.deploy(
        &flow(
            vec![action("send", ActionKind::SendEmail {
                template_id: "tpl1".to_string(),
            })],
            vec![edge("e1", "t1", "send")],
        ),
        "new_contact",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();
    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    assert_eq!(world.runs().len(), 1);
    assert_eq!(world.email.sent_count(), 1);
}

#[tokio::test]
async fn marketing_send_is_skipped_for_opted_out_contact() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", false);
    world.seed_template("tpl1", TemplateKind::Marketing, None);
    world.deploy(
        &flow(
            vec![
                action("send", ActionKind::SendEmail {
                    template_id: "tpl1".to_string(),
                }),
                action("end", ActionKind::Empty),
            ],
            vec![edge("e1", "t1", "send"), edge("e2", "send", "end")],
        ),
        "new_contact",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let run = &world.runs()[0];
    assert_eq!(run.status, RunStatus::Completed);
    let steps = world.steps_of(&run.id);
    assert_eq!(steps[0].status, StepStatus::Skipped);
    assert_eq!(steps[0].skip_reason.as_deref(), Some("marketing_opt_out"));
    // the run continued past the skipped node
    assert_eq!(steps[1].action_id, "end");
    assert_eq!(steps[1].status, StepStatus::Completed);
    assert_eq!(world.email.sent_count(), 0);
    assert!(world.deliveries().is_empty());
}

#[tokio::test]
async fn email_failure_is_recorded_and_run_continues() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    world.deploy(
        &flow(
            vec![
                action("send", ActionKind::SendEmail {
                    template_id: "tpl1".to_string(),
                }),
                action("end", ActionKind::Empty),
            ],
            vec![edge("e1", "t1", "send"), edge("e2", "send", "end")],
        ),
        "new_contact",
    );
    world.email.fail_next_sends();

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let run = &world.runs()[0];
    assert_eq!(run.status, RunStatus::Completed);
    let steps = world.steps_of(&run.id);
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert!(steps[0].error.as_deref().unwrap().contains("scripted failure"));
    // delivery failures never halt a run
    assert_eq!(steps[1].action_id, "end");
    assert_eq!(steps[1].status, StepStatus::Completed);

    let deliveries = world.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].status, DeliveryStatus::Failed);
}

#[tokio::test]
async fn audience_failure_stops_the_run() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.deploy(
        &flow(
            vec![
                action("sync", ActionKind::AddToAudienceList {
                    audience_list_id: "list1".to_string(),
                }),
                action("end", ActionKind::Empty),
            ],
            vec![edge("e1", "t1", "sync"), edge("e2", "sync", "end")],
        ),
        "new_contact",
    );
    world.audience.fail_next_syncs();

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let run = &world.runs()[0];
    assert_eq!(run.status, RunStatus::Completed);
    let steps = world.steps_of(&run.id);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].status, StepStatus::Failed);
}

#[tokio::test]
async fn missing_audience_credentials_halt_the_run() {
    let world = TestWorld::new();
    world.seed_workspace(false);
    world.seed_contact("c1", true);
    world.deploy(
        &flow(
            vec![
                action("sync", ActionKind::AddToAudienceList {
                    audience_list_id: "list1".to_string(),
                }),
                action("end", ActionKind::Empty),
            ],
            vec![edge("e1", "t1", "sync"), edge("e2", "sync", "end")],
        ),
        "new_contact",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    // a halted run stays pending with its cursor on the failed node
    let run = &world.runs()[0];
    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.current_node_id.as_deref(), Some("sync"));
    let steps = world.steps_of(&run.id);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert!(steps[0].error.as_deref().unwrap().contains("audience credentials"));
    assert!(world.audience.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn halted_run_does_not_block_a_later_firing() {
    let world = TestWorld::new();
    world.seed_workspace(false);
    world.seed_contact("c1", true);
    world.deploy(
        &flow(
            vec![action("sync", ActionKind::AddToAudienceList {
                audience_list_id: "list1".to_string(),
            })],
            vec![edge("e1", "t1", "sync")],
        ),
        "new_contact",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();
    assert_eq!(world.runs().len(), 1);

    // the operator adds the missing credentials and the trigger fires
    // again; the pending halted run must not satisfy the completed-run
    // gate
    let mut workspace = world.store.workspaces().find("w1").unwrap();
    workspace.audience_api_key = Some("key".to_string());
    workspace.audience_server = Some("audience.test".to_string());
    world.store.workspaces().update(&workspace).unwrap();

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let runs = world.runs();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().any(|r| r.status == RunStatus::Completed));
    assert_eq!(world.audience.added.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn deploy_rejects_a_malformed_flow() {
    let world = TestWorld::new();
    let model = flow(
        vec![action("a1", ActionKind::Empty)],
        vec![edge("e1", "t1", "missing")],
    );

    let err = world.store.deploy(&model).unwrap_err();
    assert!(err.to_string().contains("unknown target"));
    assert!(!world.store.flows().exists("f1").unwrap());
}

#[tokio::test]
async fn disabled_action_is_passed_through() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    let mut model = flow(
        vec![
            action("send", ActionKind::SendEmail {
                template_id: "tpl1".to_string(),
            }),
            action("end", ActionKind::Empty),
        ],
        vec![edge("e1", "t1", "send"), edge("e2", "send", "end")],
    );
    model.actions[0].enabled = false;
    world.deploy(&model, "new_contact");

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let run = &world.runs()[0];
    let steps = world.steps_of(&run.id);
    assert_eq!(steps[0].status, StepStatus::Skipped);
    assert_eq!(steps[0].skip_reason.as_deref(), Some("disabled"));
    assert_eq!(steps[1].action_id, "end");
    assert_eq!(world.email.sent_count(), 0);
}

#[tokio::test]
async fn template_group_sends_first_undelivered_template() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_template("tpl1", TemplateKind::Marketing, Some(("g1", 1)));
    world.seed_template("tpl2", TemplateKind::Marketing, Some(("g1", 2)));
    // tpl1 already went out in an earlier campaign
    world
        .store
        .deliveries()
        .create(&dripflow::store::data::Delivery {
            id: "d0".to_string(),
            contact_id: "c1".to_string(),
            template_id: "tpl1".to_string(),
            status: DeliveryStatus::Sent,
            provider_id: None,
            error: None,
            timestamp: 1,
        })
        .unwrap();
    world.deploy(
        &flow(
            vec![action("send", ActionKind::SendEmailFromTemplateGroup {
                template_group_id: "g1".to_string(),
            })],
            vec![edge("e1", "t1", "send")],
        ),
        "new_contact",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    assert_eq!(world.email.sent_count(), 1);
    let sent = world.email.sent.lock().unwrap();
    assert_eq!(sent[0].subject, "subject tpl2");
    // marketing template carries an unsubscribe link
    assert!(sent[0].unsubscribe_url.as_deref().unwrap().starts_with("https://acme.test/unsubscribe/"));
}

#[tokio::test]
async fn exhausted_template_group_is_skipped() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_template("tpl1", TemplateKind::Marketing, Some(("g1", 1)));
    world
        .store
        .deliveries()
        .create(&dripflow::store::data::Delivery {
            id: "d0".to_string(),
            contact_id: "c1".to_string(),
            template_id: "tpl1".to_string(),
            status: DeliveryStatus::Sent,
            provider_id: None,
            error: None,
            timestamp: 1,
        })
        .unwrap();
    world.deploy(
        &flow(
            vec![
                action("send", ActionKind::SendEmailFromTemplateGroup {
                    template_group_id: "g1".to_string(),
                }),
                action("end", ActionKind::Empty),
            ],
            vec![edge("e1", "t1", "send"), edge("e2", "send", "end")],
        ),
        "new_contact",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    let run = &world.runs()[0];
    let steps = world.steps_of(&run.id);
    assert_eq!(steps[0].status, StepStatus::Skipped);
    assert_eq!(steps[0].skip_reason.as_deref(), Some("group_exhausted"));
    assert_eq!(steps[1].action_id, "end");
    assert_eq!(world.email.sent_count(), 0);
}

#[tokio::test]
async fn paused_flow_drops_the_invocation() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    let mut model = flow(
        vec![action("send", ActionKind::SendEmail {
            template_id: "tpl1".to_string(),
        })],
        vec![edge("e1", "t1", "send")],
    );
    model.paused = true;
    world.deploy(&model, "new_contact");

    world.dispatcher.dispatch(TriggerInvocation::for_contact("trig1", "c1")).await.unwrap();

    assert!(world.runs().is_empty());
    assert_eq!(world.email.sent_count(), 0);
}

#[tokio::test]
async fn order_trigger_resolves_the_contact_through_the_order() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_contact("c1", true);
    world.seed_order("o1", "c1", OrderStatus::Completed, 9000);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    world.deploy(
        &flow(
            vec![action("send", ActionKind::SendEmail {
                template_id: "tpl1".to_string(),
            })],
            vec![edge("e1", "t1", "send")],
        ),
        "new_order",
    );

    world.dispatcher.dispatch(TriggerInvocation::for_order("trig1", "o1")).await.unwrap();

    let run = &world.runs()[0];
    assert_eq!(run.order_id.as_deref(), Some("o1"));
    assert_eq!(run.contact_id.as_deref(), Some("c1"));
    assert_eq!(world.email.sent_count(), 1);
    assert_eq!(world.email.sent.lock().unwrap()[0].to, "c1@example.com");
}

#[tokio::test]
async fn invocation_missing_its_subject_is_an_error() {
    let world = TestWorld::new();
    world.seed_workspace(true);
    world.seed_template("tpl1", TemplateKind::Transactional, None);
    world.deploy(
        &flow(
            vec![action("send", ActionKind::SendEmail {
                template_id: "tpl1".to_string(),
            })],
            vec![edge("e1", "t1", "send")],
        ),
        "new_contact",
    );

    let invocation = TriggerInvocation {
        trigger_id: "trig1".to_string(),
        contact_id: None,
        order_id: Some("o1".to_string()),
    };
    let err = world.dispatcher.dispatch(invocation).await.unwrap_err();
    assert!(err.to_string().contains("contact_id"));
    assert!(world.runs().is_empty());
}
