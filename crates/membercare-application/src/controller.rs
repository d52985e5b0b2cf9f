//! Screen controller.
//!
//! One `ScreenController` per screen instance. It owns the staged form, the
//! list snapshot with its query and category, the lifecycle state, and the
//! pending user notice. Every gateway failure stops here: the state moves to
//! an error state the user can retry from, a [`Notice`] is recorded, and the
//! error is returned to the caller for anything that wants to react to it.
//!
//! # Concurrency
//!
//! - Mutating calls (`submit`, `upload`, `remove`) share one in-flight guard;
//!   a second one while the first is outstanding fails with
//!   [`MembercareError::SubmitInFlight`] and never reaches the gateway.
//! - [`ScreenController::teardown`] cancels the screen's token. Outstanding
//!   calls resolve to [`MembercareError::Cancelled`] and commit nothing.

use crate::screens::ScreenProfile;
use membercare_core::error::{MembercareError, Result};
use membercare_core::filter::{Category, ListSnapshot};
use membercare_core::form::{FormState, ValidationErrors};
use membercare_core::gateway::{RecordGateway, UploadFile, UploadForm};
use membercare_core::notice::Notice;
use membercare_core::record::{FieldValue, Record, RecordId};
use membercare_core::screen::{ScreenEvent, ScreenState};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub const SAVED_MESSAGE: &str = "Saved successfully.";
pub const REMOVED_MESSAGE: &str = "Removed successfully.";
/// Appended to the success notice when the follow-up list fetch fails.
pub const LIST_STALE_MESSAGE: &str = "The list could not be updated. Refresh to try again.";

#[derive(Debug)]
struct ScreenInner {
    state: ScreenState,
    form: FormState,
    snapshot: ListSnapshot,
    query: String,
    category: Category,
    notice: Option<Notice>,
}

/// Holds the in-flight flag until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| MembercareError::SubmitInFlight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ScreenController {
    gateway: Arc<dyn RecordGateway>,
    profile: ScreenProfile,
    inner: RwLock<ScreenInner>,
    in_flight: AtomicBool,
    cancel: CancellationToken,
}

impl ScreenController {
    pub fn new(gateway: Arc<dyn RecordGateway>, profile: ScreenProfile) -> Self {
        let inner = ScreenInner {
            state: ScreenState::Idle,
            form: FormState::new(profile.schema.clone()),
            snapshot: ListSnapshot::default(),
            query: String::new(),
            category: Category::All,
            notice: None,
        };
        Self {
            gateway,
            profile,
            inner: RwLock::new(inner),
            in_flight: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn profile(&self) -> &ScreenProfile {
        &self.profile
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Cancels outstanding calls. Nothing is committed after this.
    pub fn teardown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("[ScreenController] Tearing down '{}'", self.profile.resource.name);
            self.cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Fetches the collection and replaces the snapshot.
    ///
    /// A refresh while the screen is already loading or submitting is a no-op.
    pub async fn refresh(&self) -> Result<()> {
        self.ensure_active()?;
        {
            let mut inner = self.inner.write().await;
            if inner.state.is_busy() {
                tracing::debug!(
                    "[ScreenController] Refresh of '{}' skipped while {}",
                    self.profile.resource.name,
                    inner.state
                );
                return Ok(());
            }
            inner.state = inner.state.transition(ScreenEvent::Refresh)?;
        }

        match self.until_cancelled(self.gateway.list(&self.profile.resource)).await {
            Ok(items) => {
                tracing::debug!(
                    "[ScreenController] Loaded {} {}",
                    items.len(),
                    self.profile.resource.name
                );
                self.commit(|inner| {
                    inner.snapshot.replace(items);
                    inner.state = inner.state.transition(ScreenEvent::LoadSucceeded)?;
                    Ok(())
                })
                .await
            }
            Err(MembercareError::Cancelled) => Err(MembercareError::Cancelled),
            Err(error) => {
                tracing::warn!(
                    "[ScreenController] Loading '{}' failed: {}",
                    self.profile.resource.name,
                    error
                );
                self.commit(|inner| {
                    inner.state = inner
                        .state
                        .transition(ScreenEvent::LoadFailed(error.user_message()))?;
                    inner.notice = Notice::from_error(&error);
                    Ok(())
                })
                .await?;
                Err(error)
            }
        }
    }

    // ------------------------------------------------------------------
    // Form
    // ------------------------------------------------------------------

    /// Stages a field value. Always succeeds; the screen enters `Editing`
    /// unless a call is outstanding.
    pub async fn set_field(&self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let mut inner = self.inner.write().await;
        inner.form.set_field(name, value);
        Self::enter_editing(&mut inner);
    }

    /// Loads an existing record into the form, e.g. to edit a list entry.
    pub async fn begin_edit(&self, record: Record) {
        let mut inner = self.inner.write().await;
        inner.form.reset(record);
        Self::enter_editing(&mut inner);
    }

    /// Clears the form back to an empty record.
    pub async fn reset_form(&self) {
        self.inner.write().await.form.reset(Record::new());
    }

    pub async fn validate(&self) -> ValidationErrors {
        self.inner.write().await.form.validate()
    }

    /// Validates and sends the staged record: `update` when it already has an
    /// id, `create` otherwise.
    ///
    /// On failure the staged record is kept as-is so nothing the user typed
    /// is lost. On success the form is cleared, unless fields were edited
    /// while the request was out; those edits stay staged. List screens then
    /// fetch the list again.
    pub async fn submit(&self) -> Result<Record> {
        self.send(None).await
    }

    /// Like [`submit`](Self::submit), but sends the staged fields as
    /// multipart text parts together with `file`.
    pub async fn upload(&self, file: UploadFile) -> Result<Record> {
        self.send(Some(file)).await
    }

    /// Deletes a record and refreshes the list.
    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        self.ensure_active()?;
        let guard = InFlight::acquire(&self.in_flight).inspect_err(|_| {
            tracing::warn!("[ScreenController] Remove rejected: a request is already in flight");
        })?;

        let resource = &self.profile.resource;
        match self.until_cancelled(self.gateway.remove(resource, id)).await {
            Ok(()) => {
                tracing::info!("[ScreenController] Removed {} from '{}'", id, resource.name);
                self.commit(|inner| {
                    inner.notice = Some(Notice::info(REMOVED_MESSAGE));
                    Ok(())
                })
                .await?;
            }
            Err(MembercareError::Cancelled) => return Err(MembercareError::Cancelled),
            Err(error) => {
                tracing::warn!("[ScreenController] Removing {} failed: {}", id, error);
                self.commit(|inner| {
                    inner.notice = Notice::from_error(&error);
                    Ok(())
                })
                .await?;
                return Err(error);
            }
        }

        drop(guard);
        self.refresh_after_change(REMOVED_MESSAGE).await;
        Ok(())
    }

    async fn send(&self, file: Option<UploadFile>) -> Result<Record> {
        self.ensure_active()?;
        let guard = InFlight::acquire(&self.in_flight).inspect_err(|_| {
            tracing::warn!("[ScreenController] Submit rejected: a request is already in flight");
        })?;

        let record = {
            let mut inner = self.inner.write().await;
            if inner.state.is_busy() {
                return Err(MembercareError::SubmitInFlight);
            }
            Self::enter_editing(&mut inner);

            match inner.form.submission() {
                Ok(record) => {
                    inner.state = inner.state.transition(ScreenEvent::Submit)?;
                    record
                }
                Err(errors) => {
                    tracing::debug!(
                        "[ScreenController] Submit blocked by {} invalid field(s)",
                        errors.len()
                    );
                    let error = MembercareError::Validation(errors);
                    inner.notice = Notice::from_error(&error);
                    return Err(error);
                }
            }
        };

        let resource = &self.profile.resource;
        let outcome = match (file, record.id()) {
            (Some(file), _) => {
                let form = UploadForm {
                    file: Some(file),
                    ..UploadForm::from_record(&record)
                };
                self.until_cancelled(self.gateway.upload(resource, form)).await
            }
            (None, Some(id)) => self.until_cancelled(self.gateway.update(resource, id, &record)).await,
            (None, None) => self.until_cancelled(self.gateway.create(resource, &record)).await,
        };

        let saved = match outcome {
            Ok(saved) => saved,
            Err(MembercareError::Cancelled) => return Err(MembercareError::Cancelled),
            Err(error) => {
                tracing::warn!("[ScreenController] Submitting to '{}' failed: {}", resource.name, error);
                self.commit(|inner| {
                    inner.state = inner
                        .state
                        .transition(ScreenEvent::SubmitFailed(error.user_message()))?;
                    inner.notice = Notice::from_error(&error);
                    Ok(())
                })
                .await?;
                return Err(error);
            }
        };

        tracing::info!(
            "[ScreenController] Saved {} ({})",
            resource.name,
            saved.id().map(RecordId::as_str).unwrap_or("no id")
        );
        self.commit(|inner| {
            let edited_meanwhile = inner.form.staged() != &record;
            if edited_meanwhile {
                // Keep what was typed during the request, bound to the saved record.
                let mut kept = inner.form.staged().clone();
                if kept.id().is_none() {
                    kept.set_id(saved.id().cloned());
                }
                inner.form.reset(kept);
            } else {
                inner.form.reset(Record::new());
            }
            inner.state = inner.state.transition(ScreenEvent::SubmitSucceeded)?;
            if edited_meanwhile {
                Self::enter_editing(inner);
            }
            inner.notice = Some(Notice::info(SAVED_MESSAGE));
            Ok(())
        })
        .await?;

        drop(guard);
        self.refresh_after_change(SAVED_MESSAGE).await;
        Ok(saved)
    }

    // ------------------------------------------------------------------
    // List
    // ------------------------------------------------------------------

    pub async fn set_query(&self, query: impl Into<String>) {
        self.inner.write().await.query = query.into();
    }

    pub async fn set_category(&self, category: impl Into<Category>) {
        self.inner.write().await.category = category.into();
    }

    /// The snapshot filtered by the current query and category.
    pub async fn visible(&self) -> Vec<Record> {
        let inner = self.inner.read().await;
        self.profile
            .filter
            .filter(inner.snapshot.items(), &inner.query, &inner.category)
    }

    /// Category selector entries for the current snapshot.
    pub async fn categories(&self) -> Vec<Category> {
        let inner = self.inner.read().await;
        self.profile.filter.categories(inner.snapshot.items())
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    // ------------------------------------------------------------------
    // Read-only state
    // ------------------------------------------------------------------

    pub async fn state(&self) -> ScreenState {
        self.inner.read().await.state.clone()
    }

    pub async fn staged(&self) -> Record {
        self.inner.read().await.form.staged().clone()
    }

    pub async fn errors(&self) -> ValidationErrors {
        self.inner.read().await.form.errors().clone()
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.inner.read().await.notice.clone()
    }

    /// Returns and clears the pending notice.
    pub async fn dismiss_notice(&self) -> Option<Notice> {
        self.inner.write().await.notice.take()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(MembercareError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn enter_editing(inner: &mut ScreenInner) {
        if inner.state.is_busy() || inner.state == ScreenState::Editing {
            return;
        }
        match inner.state.transition(ScreenEvent::Edit) {
            Ok(next) => inner.state = next,
            Err(e) => tracing::debug!("[ScreenController] {}", e),
        }
    }

    /// Runs `call` unless the screen is torn down first.
    async fn until_cancelled<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MembercareError::Cancelled),
            result = call => result,
        }
    }

    /// Applies a state change if the screen is still active.
    async fn commit<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ScreenInner) -> Result<()>,
    {
        let mut inner = self.inner.write().await;
        if self.cancel.is_cancelled() {
            tracing::debug!(
                "[ScreenController] Dropping response for torn-down '{}'",
                self.profile.resource.name
            );
            return Err(MembercareError::Cancelled);
        }
        apply(&mut inner)
    }

    /// Re-fetches a list screen after a successful change.
    ///
    /// A failed fetch must not read as a failed change, so the notice keeps
    /// `done` and only adds that the list is stale.
    async fn refresh_after_change(&self, done: &str) {
        if !self.profile.lists {
            return;
        }
        match self.refresh().await {
            Ok(()) | Err(MembercareError::Cancelled) => {}
            Err(e) => {
                tracing::debug!("[ScreenController] Refresh after change failed: {}", e);
                let _ = self
                    .commit(|inner| {
                        inner.notice = Some(Notice::info(format!("{} {}", done, LIST_STALE_MESSAGE)));
                        Ok(())
                    })
                    .await;
            }
        }
    }
}

impl Drop for ScreenController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
