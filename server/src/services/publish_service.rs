//! Publish admission, review gating, and publish queries.
//!
//! Admission is idempotent per (commit, environment): an existing row is
//! classified instead of duplicated, and the unique index on the pair closes
//! the read-then-write race (lost inserts retry classification once).

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::app::App;
use crate::models::iteration::Iteration;
use crate::models::publish::{NewPublish, Publish};
use crate::models::review::Review;
use crate::models::user::User;
use crate::pagination;
use crate::registry::{self, PublishEnv, ReviewVerdict, STATUS_DAILY_QUEUED, STATUS_PENDING_REVIEW};
use crate::schema::{apps, iterations, publish_logs, publishes, reviews, users};

pub const MSG_REVIEW_FAILED: &str = "code review failed, branch cannot publish";
pub const MSG_UNDER_REVIEW: &str = "code review in progress, branch cannot publish";
pub const MSG_ALREADY_PUBLISHED: &str = "this commit has already been published";
pub const MSG_UNKNOWN_ENV: &str = "unknown publish environment";

/// Soft-rejection text returned when an online publish is recorded without
/// an approved review.
pub const REVIEW_REQUIRED_TEXT: &str =
    "this iteration has not passed code review; create a code review before publishing online";

/// Outcome of a publish admission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The publish (new or resumed) may proceed; report its id.
    Proceed { publish_id: i64 },
    /// Created, but blocked pending review — the online first-admission path.
    ReviewRequired { publish_id: i64 },
    /// Business rejection with a caller-visible message.
    Rejected { message: &'static str },
}

/// Classify an existing publish for the same (commit, environment).
///
/// This table is the entire admission state machine; status transitions
/// after creation belong to the deployment executor.
fn classify_existing(publish_id: i64, status: &str, review_status: Option<&str>) -> Admission {
    match status {
        STATUS_PENDING_REVIEW => match review_status.map(registry::review_verdict) {
            Some(ReviewVerdict::Approved) => Admission::Proceed { publish_id },
            Some(ReviewVerdict::Rejected) => Admission::Rejected {
                message: MSG_REVIEW_FAILED,
            },
            // Pending review, or no review created yet.
            _ => Admission::Rejected {
                message: MSG_UNDER_REVIEW,
            },
        },
        STATUS_DAILY_QUEUED => Admission::Proceed { publish_id },
        _ => Admission::Rejected {
            message: MSG_ALREADY_PUBLISHED,
        },
    }
}

/// Look up and classify an in-flight publish for (commit, environment).
async fn classify_match(
    conn: &mut AsyncPgConnection,
    commit: &str,
    env: PublishEnv,
) -> Result<Option<Admission>, ApiError> {
    let existing: Option<Publish> = publishes::table
        .filter(publishes::commit.eq(commit))
        .filter(publishes::environment.eq(env.code()))
        .first(conn)
        .await
        .optional()?;

    let Some(publish) = existing else {
        return Ok(None);
    };

    let review_status = match (publish.status.as_str(), publish.review_id) {
        (STATUS_PENDING_REVIEW, Some(review_id)) => {
            let review: Review = reviews::table
                .find(review_id)
                .first(conn)
                .await
                .optional()?
                .ok_or(ApiError::NotFound("review"))?;
            Some(review.review_status)
        }
        _ => None,
    };

    Ok(Some(classify_existing(
        publish.id,
        &publish.status,
        review_status.as_deref(),
    )))
}

/// Admit a publish request for (branch, commit) into an environment.
///
/// At most one publish row is created per call; when a matching row already
/// exists it is classified instead.
pub async fn admit_publish(
    conn: &mut AsyncPgConnection,
    branch: &str,
    user_id: i64,
    repository: &str,
    commit: &str,
    publish_env: &str,
) -> Result<Admission, ApiError> {
    let Some(env) = PublishEnv::from_code(publish_env) else {
        return Ok(Admission::Rejected {
            message: MSG_UNKNOWN_ENV,
        });
    };

    // Idempotent lookup precedes creation.
    if let Some(admission) = classify_match(conn, commit, env).await? {
        crate::metrics::publish_admission("existing");
        return Ok(admission);
    }

    let app: App = apps::table
        .filter(apps::repository.eq(repository))
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    let iteration: Iteration = iterations::table
        .filter(iterations::app_id.eq(app.id))
        .filter(iterations::branch.eq(branch))
        .order(iterations::id.asc())
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("iteration"))?;

    let publisher: User = users::table
        .find(user_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("user"))?;

    let app_id = app.id;
    let iteration_id = iteration.id;
    let publisher_id = publisher.id;

    // One transaction covers the log and publish rows: a failed or lost
    // publish insert must not leave an orphaned empty log behind.
    let inserted: Option<i64> = conn
        .transaction(|conn| {
            async move {
                let log_id: i64 = diesel::insert_into(publish_logs::table)
                    .values(publish_logs::content.eq(""))
                    .returning(publish_logs::id)
                    .get_result(conn)
                    .await?;

                let new_publish = NewPublish {
                    app_id,
                    iteration_id,
                    publisher_id,
                    commit: commit.to_string(),
                    environment: env.code().to_string(),
                    status: env.initial_status().to_string(),
                    log_id,
                    review_id: None,
                };

                let inserted: Option<i64> = diesel::insert_into(publishes::table)
                    .values(&new_publish)
                    .on_conflict((publishes::commit, publishes::environment))
                    .do_nothing()
                    .returning(publishes::id)
                    .get_result(conn)
                    .await
                    .optional()?;

                if inserted.is_none() {
                    diesel::delete(publish_logs::table.find(log_id))
                        .execute(conn)
                        .await?;
                }

                Ok::<Option<i64>, ApiError>(inserted)
            }
            .scope_boxed()
        })
        .await?;

    match inserted {
        Some(publish_id) => {
            crate::metrics::publish_admission("created");
            tracing::info!(
                publish_id,
                app_id,
                commit,
                env = env.code(),
                "publish created"
            );
            if env.requires_review() {
                Ok(Admission::ReviewRequired { publish_id })
            } else {
                Ok(Admission::Proceed { publish_id })
            }
        }
        None => {
            // Lost the (commit, environment) race; the transaction already
            // dropped the log row. Classify the publish that won, exactly once.
            crate::metrics::publish_admission("conflict");
            classify_match(conn, commit, env)
                .await?
                .ok_or(ApiError::Database(diesel::result::Error::NotFound))
        }
    }
}

// ── Queries / presentation ──

/// Equality filters for the publish list. `app_id` is mandatory; the rest
/// mean "no constraint" when absent.
#[derive(Debug, Clone, Default)]
pub struct PublishFilters {
    pub app_id: i64,
    pub iteration_id: Option<i64>,
    pub publisher_id: Option<i64>,
    pub status: Option<String>,
    pub environment: Option<String>,
}

/// Denormalized list row for transport.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishListItem {
    pub publish_id: i64,
    pub create_time: i64,
    pub app_id: i64,
    pub app_name: String,
    pub iteration_id: i64,
    pub iteration_name: String,
    pub version: String,
    pub publisher: String,
    pub publisher_avatar: String,
    pub commit: String,
    pub publish_env: String,
    pub publish_status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPage {
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub total: usize,
    pub list: Vec<PublishListItem>,
}

/// Validate list filters. Only the environment is checked against its
/// registry: the deployment executor writes publish status codes outside the
/// admission set, and rows legitimately hold them, so any status code passes
/// through to the equality filter as-is.
fn check_filters(filters: &PublishFilters) -> Result<(), ApiError> {
    if let Some(env) = filters.environment.as_deref() {
        if PublishEnv::from_code(env).is_none() {
            return Err(ApiError::Rejected(MSG_UNKNOWN_ENV));
        }
    }
    Ok(())
}

fn list_item(publish: &Publish, app: &App, iteration: &Iteration, publisher: &User) -> PublishListItem {
    PublishListItem {
        publish_id: publish.id,
        create_time: publish.create_time.timestamp_millis(),
        app_id: app.id,
        app_name: app.app_name.clone(),
        iteration_id: iteration.id,
        iteration_name: iteration.iteration_name.clone(),
        version: iteration.version.clone(),
        publisher: publisher.user_name.clone(),
        publisher_avatar: publisher.user_avatar.clone(),
        commit: publish.commit.clone(),
        publish_env: publish.environment.clone(),
        publish_status: publish.status.clone(),
    }
}

/// List publishes matching the filters, newest first, windowed to one page.
pub async fn list_publishes(
    conn: &mut AsyncPgConnection,
    filters: PublishFilters,
    page: usize,
    page_size: usize,
) -> Result<PublishPage, ApiError> {
    let app: App = apps::table
        .find(filters.app_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    check_filters(&filters)?;

    let mut query = publishes::table
        .filter(publishes::app_id.eq(app.id))
        .into_boxed();
    if let Some(iteration_id) = filters.iteration_id {
        query = query.filter(publishes::iteration_id.eq(iteration_id));
    }
    if let Some(publisher_id) = filters.publisher_id {
        query = query.filter(publishes::publisher_id.eq(publisher_id));
    }
    if let Some(status) = filters.status {
        query = query.filter(publishes::status.eq(status));
    }
    if let Some(env) = filters.environment {
        query = query.filter(publishes::environment.eq(env));
    }

    let rows: Vec<Publish> = query
        .order(publishes::create_time.desc())
        .load(conn)
        .await?;

    let window = pagination::window(rows.len(), page, page_size)?;
    let visible = pagination::apply(rows, window);

    let mut list = Vec::with_capacity(visible.len());
    for publish in &visible {
        let iteration: Iteration = iterations::table
            .find(publish.iteration_id)
            .first(conn)
            .await
            .optional()?
            .ok_or(ApiError::NotFound("iteration"))?;
        let publisher: User = users::table
            .find(publish.publisher_id)
            .first(conn)
            .await
            .optional()?
            .ok_or(ApiError::NotFound("user"))?;

        list.push(list_item(publish, &app, &iteration, &publisher));
    }

    Ok(PublishPage {
        page,
        page_size,
        has_more: window.has_more,
        total: window.total,
        list,
    })
}

/// Denormalized detail projection; review fields are inlined only when a
/// review is attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDetail {
    pub publish_id: i64,
    pub publisher: String,
    pub publisher_avatar: String,
    pub commit: String,
    pub create_time: i64,
    pub publish_env: String,
    pub publish_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

fn detail_projection(publish: &Publish, publisher: &User, review: Option<&Review>) -> PublishDetail {
    PublishDetail {
        publish_id: publish.id,
        publisher: publisher.user_name.clone(),
        publisher_avatar: publisher.user_avatar.clone(),
        commit: publish.commit.clone(),
        create_time: publish.create_time.timestamp_millis(),
        publish_env: publish.environment.clone(),
        publish_status: publish.status.clone(),
        review_id: review.map(|r| r.id),
        review_status: review.map(|r| r.review_status.clone()),
        fail_reason: review.and_then(|r| r.fail_reason.clone()),
    }
}

pub async fn get_publish_detail(
    conn: &mut AsyncPgConnection,
    publish_id: i64,
) -> Result<PublishDetail, ApiError> {
    let publish: Publish = publishes::table
        .find(publish_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("publish"))?;

    let publisher: User = users::table
        .find(publish.publisher_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("user"))?;

    let review: Option<Review> = match publish.review_id {
        Some(review_id) => Some(
            reviews::table
                .find(review_id)
                .first(conn)
                .await
                .optional()?
                .ok_or(ApiError::NotFound("review"))?,
        ),
        None => None,
    };

    Ok(detail_projection(&publish, &publisher, review.as_ref()))
}

/// Fetch the log content attached to a publish.
pub async fn get_publish_log(
    conn: &mut AsyncPgConnection,
    publish_id: i64,
) -> Result<String, ApiError> {
    let publish: Publish = publishes::table
        .find(publish_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("publish"))?;

    let content: Option<String> = publish_logs::table
        .find(publish.log_id)
        .select(publish_logs::content)
        .first(conn)
        .await
        .optional()?;

    content.ok_or(ApiError::NotFound("publish log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{STATUS_DAILY_ACCEPTED, STATUS_DAILY_QUEUED, STATUS_PENDING_REVIEW};
    use chrono::{TimeZone, Utc};

    #[test]
    fn queued_publish_is_resumable() {
        assert_eq!(
            classify_existing(42, STATUS_DAILY_QUEUED, None),
            Admission::Proceed { publish_id: 42 }
        );
    }

    #[test]
    fn approved_review_resumes_the_original_publish() {
        assert_eq!(
            classify_existing(7, STATUS_PENDING_REVIEW, Some("7001")),
            Admission::Proceed { publish_id: 7 }
        );
    }

    #[test]
    fn rejected_review_blocks_publication() {
        assert_eq!(
            classify_existing(7, STATUS_PENDING_REVIEW, Some("7002")),
            Admission::Rejected {
                message: MSG_REVIEW_FAILED
            }
        );
    }

    #[test]
    fn in_flight_review_blocks_publication() {
        assert_eq!(
            classify_existing(7, STATUS_PENDING_REVIEW, Some("7003")),
            Admission::Rejected {
                message: MSG_UNDER_REVIEW
            }
        );
    }

    #[test]
    fn missing_review_counts_as_in_flight() {
        // An online publish starts life without a review attached.
        assert_eq!(
            classify_existing(7, STATUS_PENDING_REVIEW, None),
            Admission::Rejected {
                message: MSG_UNDER_REVIEW
            }
        );
    }

    #[test]
    fn any_other_status_rejects_readmission() {
        for status in [STATUS_DAILY_ACCEPTED, "4005", "9999", ""] {
            assert_eq!(
                classify_existing(7, status, None),
                Admission::Rejected {
                    message: MSG_ALREADY_PUBLISHED
                }
            );
        }
    }

    #[test]
    fn executor_written_status_codes_pass_the_filter_check() {
        // The executor moves rows past the admission set; filtering by such
        // a code must reach the query, not bounce off a registry lookup.
        let filters = PublishFilters {
            app_id: 1,
            status: Some("4005".into()),
            ..Default::default()
        };
        assert!(check_filters(&filters).is_ok());
    }

    #[test]
    fn unknown_environment_filter_is_rejected() {
        let filters = PublishFilters {
            app_id: 1,
            environment: Some("staging".into()),
            ..Default::default()
        };
        assert!(matches!(
            check_filters(&filters),
            Err(ApiError::Rejected(MSG_UNKNOWN_ENV))
        ));
    }

    fn sample_publish(review_id: Option<i64>) -> Publish {
        Publish {
            id: 11,
            app_id: 1,
            iteration_id: 2,
            publisher_id: 3,
            commit: "abc123".into(),
            environment: "online".into(),
            status: STATUS_PENDING_REVIEW.into(),
            log_id: 4,
            review_id,
            create_time: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    fn sample_user() -> User {
        User {
            id: 3,
            user_name: "alice".into(),
            user_avatar: "/avatars/alice.png".into(),
        }
    }

    #[test]
    fn detail_omits_review_fields_when_no_review_attached() {
        let detail = detail_projection(&sample_publish(None), &sample_user(), None);
        let body = serde_json::to_value(&detail).unwrap();
        assert!(body.get("reviewId").is_none());
        assert!(body.get("reviewStatus").is_none());
        assert!(body.get("failReason").is_none());
        assert_eq!(body["publishStatus"], STATUS_PENDING_REVIEW);
        assert_eq!(body["createTime"], 1_700_000_000_000i64);
    }

    #[test]
    fn detail_inlines_review_fields_verbatim() {
        let review = Review {
            id: 9,
            review_status: "7002".into(),
            fail_reason: Some("style violations".into()),
        };
        let detail =
            detail_projection(&sample_publish(Some(9)), &sample_user(), Some(&review));
        let body = serde_json::to_value(&detail).unwrap();
        assert_eq!(body["reviewId"], 9);
        assert_eq!(body["reviewStatus"], "7002");
        assert_eq!(body["failReason"], "style violations");
    }

    #[test]
    fn list_item_flattens_relations() {
        let publish = sample_publish(None);
        let app = App {
            id: 1,
            app_name: "storefront".into(),
            description: String::new(),
            app_logo: String::new(),
            repository: "web/storefront".into(),
            version: String::new(),
            daily_address: String::new(),
            online_address: String::new(),
            page_prefix: "/webapp/publish".into(),
            port: Some(9001),
            publish_type: "2001".into(),
            product_type: "1001".into(),
            progressing_iteration_count: 1,
            creator_id: 3,
            create_time: Utc.timestamp_millis_opt(1_600_000_000_000).unwrap(),
        };
        let iteration = Iteration {
            id: 2,
            app_id: 1,
            iteration_name: "checkout rework".into(),
            branch: "daily/1.0.4".into(),
            version: "1.0.4".into(),
            create_time: Utc.timestamp_millis_opt(1_650_000_000_000).unwrap(),
        };

        let item = list_item(&publish, &app, &iteration, &sample_user());
        let body = serde_json::to_value(&item).unwrap();
        assert_eq!(body["appName"], "storefront");
        assert_eq!(body["iterationName"], "checkout rework");
        assert_eq!(body["version"], "1.0.4");
        assert_eq!(body["publisher"], "alice");
        assert_eq!(body["publishEnv"], "online");
        assert_eq!(body["createTime"], 1_700_000_000_000i64);
    }
}
