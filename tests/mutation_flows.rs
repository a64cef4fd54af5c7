use assert_matches::assert_matches;
use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use worknest_shared::capabilities::{HttpError, HttpOperation};
use worknest_shared::{
    App, Applicant, ApplicationId, ApplicationStatus, Decision, Effect, ErrorKind, Event, Feed,
    HttpResponse, Model, NotificationId, NotificationItem, Page, PostingDraft, PostingStatus,
    ReputationRequest, ReputationStatus, RequestId, Role, ShiftTime, ToastKind, UserId, Weekday,
    MIN_HOURLY_WAGE,
};

fn booted(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(
        Event::Started {
            api_base: "https://api.test".into(),
            page_size: 10,
        },
        model,
    );
    app.update(
        Event::SessionRestored {
            jwt: "tok-123".into(),
            user_id: "u-1".into(),
        },
        model,
    );
}

fn http_requests(update: Update<Effect, Event>) -> Vec<Request<HttpOperation>> {
    update
        .effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            Effect::Render(_) => None,
        })
        .collect()
}

fn expect_one_request(update: Update<Effect, Event>) -> Request<HttpOperation> {
    let mut requests = http_requests(update);
    assert_eq!(requests.len(), 1, "expected exactly one HTTP request");
    requests.remove(0)
}

fn request_url(request: &Request<HttpOperation>) -> &str {
    let HttpOperation::Execute(inner) = &request.operation;
    inner.url()
}

fn request_json(request: &Request<HttpOperation>) -> serde_json::Value {
    let HttpOperation::Execute(inner) = &request.operation;
    serde_json::from_slice(inner.body().expect("request body")).expect("json body")
}

fn deliver(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    mut request: Request<HttpOperation>,
    result: Result<HttpResponse, HttpError>,
) -> Vec<Request<HttpOperation>> {
    let update = app.resolve(&mut request, result).expect("resolve request");
    let mut follow_ups = Vec::new();
    for event in update.events {
        follow_ups.extend(http_requests(app.update(event, model)));
    }
    follow_ups
}

fn applicant(id: &str, name: &str) -> Applicant {
    Applicant {
        id: ApplicationId::new(id),
        applicant_id: UserId::new("u-9"),
        name: name.into(),
        status: ApplicationStatus::Applied,
        applied_at_ms: 1_700_000_000_000,
        introduction: Some("I ran a cafe counter for two summers".into()),
        career_months: Some(14),
    }
}

fn reputation_request(id: &str, status: ReputationStatus) -> ReputationRequest {
    ReputationRequest {
        id: RequestId::new(id),
        counterpart_name: "Mina".into(),
        posting_title: "Barista".into(),
        role: Role::Seeker,
        status,
        requested_at_ms: 1_700_000_000_000,
    }
}

fn notification(id: &str) -> NotificationItem {
    NotificationItem {
        id: NotificationId::new(id),
        title: "Application update".into(),
        body: "body".into(),
        read: false,
        created_at_ms: 1_700_000_000_000,
        link: None,
    }
}

fn posting_draft() -> PostingDraft {
    PostingDraft {
        title: "Weekend barista".into(),
        description: "Espresso bar, morning shift".into(),
        hourly_wage: 12_000,
        work_days: vec![Weekday::Sat, Weekday::Sun],
        start_time: ShiftTime::new(9, 0).expect("valid time"),
        end_time: ShiftTime::new(15, 30).expect("valid time"),
    }
}

/// Loads the applicants feed for posting p-9 with two undecided applicants.
fn with_applicants(app: &AppTester<App, Effect>, model: &mut Model) {
    let update = app.update(
        Event::PostingSelected {
            posting_id: "p-9".into(),
        },
        model,
    );
    let request = expect_one_request(update);
    deliver(
        app,
        model,
        request,
        Ok(HttpResponse::json_body(
            200,
            &Page::new(vec![applicant("ap-1", "Mina"), applicant("ap-2", "Jun")], "", 2),
        )),
    );
}

#[test]
fn accept_applies_optimistically_and_settles_on_success() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);
    with_applicants(&app, &mut model);

    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-1".into(),
            decision: Decision::Accept,
        },
        &mut model,
    );
    let request = expect_one_request(update);
    assert!(request_url(&request).ends_with("/api/v1/applications/ap-1/status"));
    assert_eq!(request_json(&request)["status"], "accepted");

    // The row flips before the server answers.
    let view = app.view(&model);
    assert_eq!(view.applicants.rows[0].status, ApplicationStatus::Accepted);
    assert!(view.applicants.rows[0].is_deciding);

    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::new(200, vec![], vec![])),
    );
    let view = app.view(&model);
    assert_eq!(view.applicants.rows[0].status, ApplicationStatus::Accepted);
    assert!(!view.applicants.rows[0].is_deciding);
    assert_matches!(view.toast, Some(ref t) if t.kind == ToastKind::Success);
}

#[test]
fn rejected_decision_rolls_back_on_server_error() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);
    with_applicants(&app, &mut model);

    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-2".into(),
            decision: Decision::Reject,
        },
        &mut model,
    );
    let request = expect_one_request(update);
    assert_eq!(
        app.view(&model).applicants.rows[1].status,
        ApplicationStatus::Rejected
    );

    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::new(500, vec![], vec![])),
    );
    let view = app.view(&model);
    assert_eq!(view.applicants.rows[1].status, ApplicationStatus::Applied);
    assert!(!view.applicants.rows[1].is_deciding);
    assert_matches!(view.error, Some(ref e) if e.error_code == "INTERNAL_ERROR");
}

#[test]
fn conflicting_decision_reverts_and_refreshes_the_feed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);
    with_applicants(&app, &mut model);

    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-1".into(),
            decision: Decision::Accept,
        },
        &mut model,
    );
    let request = expect_one_request(update);

    // Someone else decided first: revert and re-fetch instead of trusting
    // the optimistic row.
    let follow_ups = deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::new(409, vec![], vec![])),
    );
    assert_eq!(follow_ups.len(), 1);
    assert!(request_url(&follow_ups[0]).contains("/api/v1/postings/p-9/applicants"));
    assert_matches!(app.view(&model).toast, Some(ref t) if t.kind == ToastKind::Warning);

    deliver(
        &app,
        &mut model,
        follow_ups.into_iter().next().expect("refresh request"),
        Ok(HttpResponse::json_body(
            200,
            &Page::new(vec![applicant("ap-2", "Jun")], "", 1),
        )),
    );
    assert_eq!(app.view(&model).applicants.rows.len(), 1);
}

#[test]
fn duplicate_decision_is_ignored_while_in_flight() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);
    with_applicants(&app, &mut model);

    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-1".into(),
            decision: Decision::Accept,
        },
        &mut model,
    );
    assert_eq!(http_requests(update).len(), 1);

    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-1".into(),
            decision: Decision::Reject,
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());
    // The first decision still stands in the list.
    assert_eq!(
        app.view(&model).applicants.rows[0].status,
        ApplicationStatus::Accepted
    );
}

#[test]
fn decisions_are_blocked_offline_and_signed_out() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);
    with_applicants(&app, &mut model);

    app.update(Event::NetworkStatusChanged { online: false }, &mut model);
    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-1".into(),
            decision: Decision::Accept,
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());
    assert_matches!(app.view(&model).toast, Some(ref t) if t.kind == ToastKind::Warning);

    // Signed out entirely: the mutation is refused with an auth error.
    let mut model = Model::default();
    app.update(
        Event::Started {
            api_base: "https://api.test".into(),
            page_size: 10,
        },
        &mut model,
    );
    let update = app.update(
        Event::DecisionRequested {
            application_id: "ap-1".into(),
            decision: Decision::Accept,
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());
    assert_matches!(model.active_error, Some(ref e) if e.kind == ErrorKind::Authentication);
}

#[test]
fn opening_a_notification_marks_it_read_with_revert_on_failure() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let update = app.update(
        Event::FeedViewed {
            feed: Feed::Notifications,
        },
        &mut model,
    );
    let request = expect_one_request(update);
    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::json_body(
            200,
            &Page::new(vec![notification("n-1"), notification("n-2")], "", 2),
        )),
    );
    assert_eq!(app.view(&model).unread_notifications, 2);

    let update = app.update(
        Event::NotificationOpened {
            notification_id: "n-1".into(),
        },
        &mut model,
    );
    let request = expect_one_request(update);
    assert!(request_url(&request).ends_with("/api/v1/notifications/n-1/read"));
    assert_eq!(app.view(&model).unread_notifications, 1);

    // The server refused: quietly put the unread badge back.
    deliver(
        &app,
        &mut model,
        request,
        Err(HttpError::Timeout { timeout_ms: 30_000 }),
    );
    let view = app.view(&model);
    assert_eq!(view.unread_notifications, 2);
    assert!(view.error.is_none());

    // Opening an already-read notification does not re-post.
    let update = app.update(
        Event::NotificationOpened {
            notification_id: "n-1".into(),
        },
        &mut model,
    );
    let request = expect_one_request(update);
    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::new(204, vec![], vec![])),
    );
    let update = app.update(
        Event::NotificationOpened {
            notification_id: "n-1".into(),
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());
}

#[test]
fn review_submission_completes_the_request_in_place() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let update = app.update(
        Event::FeedViewed {
            feed: Feed::Reputation,
        },
        &mut model,
    );
    let request = expect_one_request(update);
    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::json_body(
            200,
            &Page::new(
                vec![
                    reputation_request("r-1", ReputationStatus::Pending),
                    reputation_request("r-2", ReputationStatus::Completed),
                ],
                "",
                2,
            ),
        )),
    );
    let view = app.view(&model);
    assert!(view.reputation.rows[0].can_review);
    assert!(!view.reputation.rows[1].can_review);

    let update = app.update(
        Event::ReviewSubmitted {
            request_id: "r-1".into(),
            score: 5,
            comment: "Punctual and kind".into(),
        },
        &mut model,
    );
    let request = expect_one_request(update);
    assert!(request_url(&request).ends_with("/api/v1/reputation/requests/r-1/review"));
    let body = request_json(&request);
    assert_eq!(body["score"], 5);
    assert_eq!(body["comment"], "Punctual and kind");

    // In flight: the row can no longer be reviewed, and a second submit
    // goes nowhere.
    assert!(!app.view(&model).reputation.rows[0].can_review);
    let update = app.update(
        Event::ReviewSubmitted {
            request_id: "r-1".into(),
            score: 4,
            comment: String::new(),
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());

    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::new(200, vec![], vec![])),
    );
    let view = app.view(&model);
    assert_eq!(view.reputation.rows[0].status, ReputationStatus::Completed);
    assert_matches!(view.toast, Some(ref t) if t.kind == ToastKind::Success);
}

#[test]
fn review_validation_failures_never_reach_the_network() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let update = app.update(
        Event::ReviewSubmitted {
            request_id: "r-1".into(),
            score: 0,
            comment: String::new(),
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());
    assert_matches!(model.active_error, Some(ref e) if e.kind == ErrorKind::Validation);

    // A request that is not pending in the loaded list is refused too.
    model.active_error = None;
    let update = app.update(
        Event::ReviewSubmitted {
            request_id: "r-unknown".into(),
            score: 4,
            comment: String::new(),
        },
        &mut model,
    );
    assert!(http_requests(update).is_empty());
    assert_matches!(app.view(&model).toast, Some(ref t) if t.kind == ToastKind::Warning);
}

#[test]
fn posting_creation_refreshes_my_postings() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let update = app.update(
        Event::PostingSubmitted(Box::new(posting_draft())),
        &mut model,
    );
    let request = expect_one_request(update);
    assert!(request_url(&request).ends_with("/api/v1/postings"));
    let body = request_json(&request);
    assert_eq!(body["title"], "Weekend barista");
    assert_eq!(body["hourlyWage"], 12_000);
    assert_eq!(body["workDays"], serde_json::json!(["sat", "sun"]));
    assert_eq!(body["startTime"], "09:00");
    assert_eq!(body["endTime"], "15:30");
    assert!(model.posting_in_flight);

    // While the create is in flight a second submit is dropped.
    let update = app.update(
        Event::PostingSubmitted(Box::new(posting_draft())),
        &mut model,
    );
    assert!(http_requests(update).is_empty());

    let follow_ups = deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::new(201, vec![], vec![])),
    );
    assert!(!model.posting_in_flight);
    assert_matches!(app.view(&model).toast, Some(ref t) if t.kind == ToastKind::Success);

    // The owner dashboard re-fetches instead of reloading the whole screen.
    assert_eq!(follow_ups.len(), 1);
    let refresh = follow_ups.into_iter().next().expect("refresh request");
    assert!(request_url(&refresh).ends_with("/api/v1/postings/mine"));
    deliver(
        &app,
        &mut model,
        refresh,
        Ok(HttpResponse::json_body(
            200,
            &serde_json::json!({
                "data": [{
                    "id": "p-1",
                    "title": "Weekend barista",
                    "hourlyWage": 12_000,
                    "status": "open",
                    "applicantCount": 0,
                    "createdAtMs": 1_700_000_000_000u64,
                }]
            }),
        )),
    );
    let view = app.view(&model);
    assert_eq!(view.my_postings.len(), 1);
    assert_eq!(view.my_postings[0].status, PostingStatus::Open);
}

#[test]
fn invalid_posting_draft_is_rejected_locally() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let mut draft = posting_draft();
    draft.hourly_wage = MIN_HOURLY_WAGE - 1;
    let update = app.update(Event::PostingSubmitted(Box::new(draft)), &mut model);
    assert!(http_requests(update).is_empty());
    assert_matches!(model.active_error, Some(ref e) if e.kind == ErrorKind::Validation);

    let mut draft = posting_draft();
    draft.work_days.clear();
    let update = app.update(Event::PostingSubmitted(Box::new(draft)), &mut model);
    assert!(http_requests(update).is_empty());

    let mut draft = posting_draft();
    draft.end_time = draft.start_time;
    let update = app.update(Event::PostingSubmitted(Box::new(draft)), &mut model);
    assert!(http_requests(update).is_empty());
}

#[test]
fn role_switch_restarts_the_reputation_feed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let update = app.update(
        Event::FeedViewed {
            feed: Feed::Reputation,
        },
        &mut model,
    );
    let request = expect_one_request(update);
    assert!(request_url(&request).contains("role=seeker"));
    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::json_body(
            200,
            &Page::new(vec![reputation_request("r-1", ReputationStatus::Pending)], "", 1),
        )),
    );

    let update = app.update(Event::RoleSwitched { role: Role::Owner }, &mut model);
    let request = expect_one_request(update);
    assert!(request_url(&request).contains("role=owner"));
    let view = app.view(&model);
    assert_eq!(view.role, Role::Owner);
    assert!(view.reputation.rows.is_empty());

    // Switching to the role already shown is a no-op.
    let update = app.update(Event::RoleSwitched { role: Role::Owner }, &mut model);
    assert!(http_requests(update).is_empty());
}

#[test]
fn my_postings_request_is_guarded_while_loading() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    booted(&app, &mut model);

    let update = app.update(Event::MyPostingsRequested, &mut model);
    let request = expect_one_request(update);
    assert!(model.my_postings_loading);

    let update = app.update(Event::MyPostingsRequested, &mut model);
    assert!(http_requests(update).is_empty());

    deliver(
        &app,
        &mut model,
        request,
        Ok(HttpResponse::json_body(
            200,
            &serde_json::json!({ "data": [] }),
        )),
    );
    assert!(!model.my_postings_loading);
    assert!(app.view(&model).my_postings.is_empty());
}
