//! JSON-lines intake server: one request per stdin line, one response per stdout line.
//!
//! Every request runs on its own task. Replies go out in completion order and
//! echo the request's `op` and optional `id`.

use color_eyre::Result;
use review_intake_core::{IntakeError, RateLimiter, ReviewPipeline};
use review_intake_models::{ContactMethod, ContactSubmission, CorrelationToken, ReviewSubmission};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};
use super::{error_json, response_json, step_json, submission_json, AppContext};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    SubmitReview {
        #[serde(default)]
        rating: Value,
        #[serde(default)]
        feedback: String,
        #[serde(default = "default_client")]
        client: String,
    },
    FeedbackDetail {
        token: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        areas: Vec<String>,
    },
    ContactInfo {
        token: String,
        wants_contact: bool,
        #[serde(default)]
        name: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        phone: String,
        #[serde(default)]
        preferred_contact: ContactMethod,
    },
    Respond {
        review_id: u64,
        responder_id: u64,
        text: String,
    },
    MarkRead {
        review_id: u64,
    },
}

fn default_client() -> String {
    "anonymous".to_string()
}

pub async fn run_serve() -> Result<()> {
    let ctx = AppContext::load()?;
    let mut scheduler = start_compaction(ctx.pipeline.limiter().clone()).await?;

    info!(
        operation = "serve_started",
        business_id = ctx.config.business.id,
        store = ctx.pipeline.store().backend_name(),
        "Accepting JSON-lines requests on stdin"
    );

    let handled = serve_lines(
        ctx.pipeline.clone(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    if let Err(e) = scheduler.shutdown().await {
        warn!(error = %e, "Compaction scheduler did not shut down cleanly");
    }
    info!(operation = "serve_stopped", requests = handled, "Intake server stopped");
    Ok(())
}

/// Read requests until EOF or ctrl-c, then wait for in-flight requests to reply.
async fn serve_lines<R, W>(pipeline: Arc<ReviewPipeline>, input: R, output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (reply_tx, reply_rx) = mpsc::channel::<Value>(REPLY_QUEUE);
    let writer = tokio::spawn(write_replies(reply_rx, output));
    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!(operation = "serve_interrupted", "Interrupted, draining in-flight requests");
                break;
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let pipeline = pipeline.clone();
        let reply_tx = reply_tx.clone();
        tokio::spawn(async move {
            let reply = handle_line(&pipeline, &line).await;
            let _ = reply_tx.send(reply).await;
        });
    }

    // The writer stops once every request task has dropped its sender
    drop(reply_tx);
    Ok(writer.await??)
}

const REPLY_QUEUE: usize = 64;

async fn write_replies<W: AsyncWrite + Unpin>(mut replies: mpsc::Receiver<Value>, mut output: W) -> Result<usize> {
    let mut written = 0usize;
    while let Some(reply) = replies.recv().await {
        let mut rendered = serde_json::to_string(&reply)?;
        rendered.push('\n');
        output.write_all(rendered.as_bytes()).await?;
        output.flush().await?;
        written += 1;
    }
    Ok(written)
}

/// Prune idle rate-limit windows every `cleanup_interval`, independent of traffic
async fn start_compaction(limiter: Arc<RateLimiter>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let interval = limiter.cleanup_interval();

    let job = Job::new_repeated_async(interval, move |_id, _lock| {
        let limiter = limiter.clone();
        Box::pin(async move {
            let stats = limiter.compact_now().await;
            debug!(
                operation = "rate_window_compaction",
                pruned = stats.pruned_timestamps,
                dropped_clients = stats.dropped_clients,
                remaining_clients = stats.remaining_clients,
                "Compacted rate-limit windows"
            );
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(operation = "scheduler_started", interval_secs = interval.as_secs(), "Rate-window compaction scheduled");
    Ok(scheduler)
}

async fn handle_line(pipeline: &ReviewPipeline, line: &str) -> Value {
    let raw: Value = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => return bad_request(&e),
    };
    let id = raw.get("id").cloned();
    let op = raw.get("op").cloned();

    let reply = match serde_json::from_value::<Request>(raw) {
        Ok(request) => match dispatch(pipeline, request).await {
            Ok(body) => with_ok(body, true),
            Err(e) => {
                if matches!(e, IntakeError::Persistence(_)) {
                    error!(operation = "request_failed", error = %e, "Request failed");
                }
                with_ok(error_json(&e), false)
            }
        },
        Err(e) => bad_request(&e),
    };
    echo(reply, id, op)
}

fn bad_request(e: &serde_json::Error) -> Value {
    warn!(operation = "bad_request", error = %e, "Unparseable request line");
    json!({
        "ok": false,
        "error": "bad_request",
        "status": 400,
        "message": e.to_string(),
    })
}

fn echo(mut reply: Value, id: Option<Value>, op: Option<Value>) -> Value {
    if let Value::Object(map) = &mut reply {
        if let Some(id) = id {
            map.insert("id".to_string(), id);
        }
        if let Some(op) = op {
            map.insert("op".to_string(), op);
        }
    }
    reply
}

async fn dispatch(pipeline: &ReviewPipeline, request: Request) -> Result<Value, IntakeError> {
    match request {
        Request::SubmitReview { rating, feedback, client } => {
            let submission = ReviewSubmission { rating, feedback };
            let outcome = pipeline.submit_review(&submission, &client).await?;
            Ok(submission_json(&outcome))
        }
        Request::FeedbackDetail { token, text, areas } => {
            let outcome = pipeline
                .submit_feedback_detail(&CorrelationToken::from(token), &text, &areas)
                .await?;
            Ok(step_json(&outcome))
        }
        Request::ContactInfo { token, wants_contact, name, email, phone, preferred_contact } => {
            let contact = ContactSubmission { wants_contact, name, email, phone, preferred_contact };
            let outcome = pipeline
                .submit_contact_info(&CorrelationToken::from(token), &contact)
                .await?;
            Ok(step_json(&outcome))
        }
        Request::Respond { review_id, responder_id, text } => {
            let response = pipeline.respond_to_review(review_id, responder_id, &text).await?;
            Ok(response_json(&response))
        }
        Request::MarkRead { review_id } => {
            let changed = pipeline.mark_read(review_id).await?;
            Ok(json!({ "review_id": review_id, "changed": changed }))
        }
    }
}

fn with_ok(mut body: Value, ok: bool) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert("ok".to_string(), Value::Bool(ok));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use review_intake_classifiers::{Classification, ClassifierError, HeuristicClassifier, SentimentClassifier};
    use review_intake_config::RateLimitConfig;
    use review_intake_core::InMemoryReviewStore;
    use review_intake_models::StarRating;
    use std::time::Duration;

    /// One-star reviews never finish classifying, like a wedged upstream
    struct StallOnOneStar(HeuristicClassifier);

    #[async_trait]
    impl SentimentClassifier for StallOnOneStar {
        fn strategy_name(&self) -> &str {
            "stall"
        }

        async fn classify(&self, rating: StarRating, feedback: &str) -> Result<Classification, ClassifierError> {
            if rating.value() == 1 {
                std::future::pending::<()>().await;
            }
            self.0.classify(rating, feedback).await
        }
    }

    fn pipeline() -> ReviewPipeline {
        ReviewPipeline::new(
            Arc::new(RateLimiter::from_config(&RateLimitConfig::default())),
            Arc::new(HeuristicClassifier::new()),
            Arc::new(InMemoryReviewStore::new()),
            1,
        )
    }

    #[tokio::test]
    async fn test_submit_then_contact_over_lines() {
        let pipeline = pipeline();
        let reply = handle_line(
            &pipeline,
            r#"{"op":"submit_review","rating":2,"feedback":"Cold food","client":"10.0.0.1"}"#,
        )
        .await;
        assert_eq!(reply["ok"], json!(true));
        assert_eq!(reply["redirect"], json!("feedback"));
        assert_eq!(reply["feedback"], json!("Cold food"));
        let token = reply["token"].as_str().unwrap().to_string();

        let line = json!({"op": "contact_info", "token": token, "wants_contact": false}).to_string();
        let reply = handle_line(&pipeline, &line).await;
        assert_eq!(reply["redirect"], json!("goodbye"));
        assert_eq!(reply["path"], json!("/goodbye"));
    }

    #[tokio::test]
    async fn test_errors_are_reported_inline() {
        let pipeline = pipeline();
        let reply = handle_line(&pipeline, r#"{"op":"submit_review","rating":"5","feedback":"hi"}"#).await;
        assert_eq!(reply["ok"], json!(false));
        assert_eq!(reply["error"], json!("invalid_rating"));
        assert_eq!(reply["status"], json!(400));

        let reply = handle_line(&pipeline, "not json").await;
        assert_eq!(reply["error"], json!("bad_request"));

        let reply = handle_line(&pipeline, r#"{"op":"feedback_detail","token":"nope"}"#).await;
        assert_eq!(reply["status"], json!(404));
    }

    #[tokio::test]
    async fn test_replies_echo_id_and_op() {
        let pipeline = pipeline();
        let reply = handle_line(&pipeline, r#"{"id":"r-1","op":"mark_read","review_id":5}"#).await;
        assert_eq!(reply["id"], json!("r-1"));
        assert_eq!(reply["op"], json!("mark_read"));
        assert_eq!(reply["status"], json!(404));

        let reply = handle_line(&pipeline, r#"{"id":9,"op":"launch_rockets"}"#).await;
        assert_eq!(reply["error"], json!("bad_request"));
        assert_eq!(reply["id"], json!(9));
    }

    #[tokio::test]
    async fn test_stalled_classification_does_not_block_other_clients() {
        let pipeline = Arc::new(ReviewPipeline::new(
            Arc::new(RateLimiter::from_config(&RateLimitConfig::default())),
            Arc::new(StallOnOneStar(HeuristicClassifier::new())),
            Arc::new(InMemoryReviewStore::new()),
            1,
        ));
        let (mut client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, client_out) = tokio::io::duplex(4096);
        let server = tokio::spawn(serve_lines(pipeline, BufReader::new(server_in), server_out));

        let requests = concat!(
            r#"{"id":1,"op":"submit_review","rating":1,"feedback":"Never arrived","client":"a"}"#,
            "\n",
            r#"{"id":2,"op":"submit_review","rating":5,"feedback":"Lovely staff","client":"b"}"#,
            "\n",
        );
        client_in.write_all(requests.as_bytes()).await.unwrap();

        let mut replies = BufReader::new(client_out).lines();
        let line = tokio::time::timeout(Duration::from_secs(5), replies.next_line())
            .await
            .expect("second client waited on the first")
            .unwrap()
            .unwrap();
        let reply: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(reply["id"], json!(2));
        assert_eq!(reply["op"], json!("submit_review"));
        assert_eq!(reply["redirect"], json!("share"));

        server.abort();
    }

    #[tokio::test]
    async fn test_serve_lines_drains_on_eof() {
        let input = concat!(
            r#"{"op":"submit_review","rating":4,"feedback":"Good","client":"a"}"#,
            "\n\n",
            "not json\n",
        );
        let (server_out, client_out) = tokio::io::duplex(4096);
        let written = serve_lines(Arc::new(pipeline()), BufReader::new(input.as_bytes()), server_out)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let mut replies = BufReader::new(client_out).lines();
        let mut errors = 0;
        for _ in 0..2 {
            let reply: Value = serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
            errors += usize::from(reply["ok"] == json!(false));
        }
        assert_eq!(errors, 1);
    }
}
