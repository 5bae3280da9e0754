//! Command handlers.
//!
//! Each handler returns the text printed on success; the CLI layer owns
//! process output and exit codes.

use std::future::Future;
use std::io;

use folio_core::{
    AuthError, LanguageCode, SessionState, UploadKind, UploadPolicy, UploadedFile, YoutubeVideo,
    persist_language, storage_object_path,
};
use tokio_stream::StreamExt;
use tracing::info;
use uuid::Uuid;

use crate::bootstrap::{AppDependencies, mount};
use crate::error::{AppError, AppResult};

/// Object prefix for uploads in the storage bucket.
pub const UPLOAD_PREFIX: &str = "uploads";

/// Mount the app and log session transitions until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error when mounting fails or the shutdown signal cannot be
/// awaited.
pub async fn run_until<F>(dependencies: &AppDependencies, shutdown: F) -> AppResult<String>
where
    F: Future<Output = io::Result<()>>,
{
    let app = mount(dependencies).await?;
    let mut changes = app.session()?.changes();
    tokio::pin!(shutdown);

    let mut observed = 0_usize;
    let signal = loop {
        tokio::select! {
            biased;
            result = &mut shutdown => break result,
            next = changes.next() => match next {
                Some(state) => {
                    log_transition(&state);
                    observed += 1;
                }
                None => break Ok(()),
            },
        }
    };
    app.teardown().await;
    signal.map_err(|source| AppError::Io {
        operation: "run.shutdown_signal",
        source,
    })?;
    Ok(format!("stopped after {observed} session updates"))
}

fn log_transition(state: &SessionState) {
    let email = state
        .identity
        .as_ref()
        .and_then(|user| user.email.as_deref())
        .unwrap_or("-");
    info!(
        signed_in = state.identity.is_some(),
        loading = state.loading,
        email,
        "session state changed"
    );
}

/// Language the site would start in, labelled in that language.
///
/// # Errors
///
/// Returns an error when the localization subsystem fails.
pub async fn language_show(dependencies: &AppDependencies) -> AppResult<String> {
    let language = dependencies.resolve_language().await?;
    let label = dependencies.catalog().text("language.switch", "Language");
    Ok(format!("{label}: {} ({language})", language.label()))
}

/// Persist `code` as the preferred language.
///
/// # Errors
///
/// Returns [`AppError::InvalidArgument`] for codes outside the supported set
/// and [`AppError::Store`] when the preference cannot be written.
pub fn language_set(dependencies: &AppDependencies, code: &str) -> AppResult<String> {
    let language = LanguageCode::parse(code).ok_or_else(|| AppError::InvalidArgument {
        field: "code",
        value: code.to_string(),
        reason: "expected one of ca, es, en",
    })?;
    persist_language(dependencies.store(), language)
        .map_err(|err| AppError::store("language.persist", err))?;
    info!(language = %language, "language preference saved");
    Ok(format!("{} ({language})", language.label()))
}

/// Sign in through the mounted session context.
///
/// # Errors
///
/// Returns [`AppError::AuthRejected`] when the provider refuses the
/// credentials, or a bootstrap error when mounting fails.
pub async fn sign_in(
    dependencies: &AppDependencies,
    email: &str,
    password: &str,
) -> AppResult<String> {
    let app = mount(dependencies).await?;
    let session = app.session()?;
    session.wait_until_loaded().await;
    let response = session.sign_in(email, password).await;
    let template = app.catalog().text("auth.signed_in_as", "Signed in as {email}");
    app.teardown().await;

    if let Some(error) = response.error {
        return Err(rejected("sign_in", error));
    }
    let signed_in = response
        .data
        .user
        .and_then(|user| user.email)
        .unwrap_or_else(|| email.to_string());
    Ok(template.replace("{email}", &signed_in))
}

/// End the current session.
///
/// # Errors
///
/// Returns [`AppError::AuthRejected`] when the provider refuses the sign-out.
pub async fn sign_out(dependencies: &AppDependencies) -> AppResult<String> {
    let app = mount(dependencies).await?;
    let session = app.session()?;
    session.wait_until_loaded().await;
    let response = session.sign_out().await;
    let text = app.catalog().text("auth.sign_out", "Sign out");
    app.teardown().await;

    match response.error {
        Some(error) => Err(rejected("sign_out", error)),
        None => Ok(text),
    }
}

/// Report the signed-in user once the initial fetch has settled.
///
/// # Errors
///
/// Returns an error when mounting fails.
pub async fn whoami(dependencies: &AppDependencies) -> AppResult<String> {
    let app = mount(dependencies).await?;
    let state = app.session()?.wait_until_loaded().await;
    let message = match state.identity.and_then(|user| user.email) {
        Some(email) => app
            .catalog()
            .text("auth.signed_in_as", "Signed in as {email}")
            .replace("{email}", &email),
        None => app.catalog().text("auth.not_signed_in", "Not signed in"),
    };
    app.teardown().await;
    Ok(message)
}

/// Embed, watch and thumbnail URLs for a YouTube link.
///
/// # Errors
///
/// Returns [`AppError::Media`] when the link is not a recognizable video.
pub fn media_youtube(url: &str) -> AppResult<String> {
    let video = YoutubeVideo::parse(url).map_err(|err| AppError::media("media.youtube", err))?;
    let mut lines = vec![
        format!("id: {}", video.id()),
        format!("embed: {}", video.embed_url()),
        format!("watch: {}", video.watch_url()),
        format!("thumbnail: {}", video.thumbnail_url()),
    ];
    if let Some(start) = video.start_seconds() {
        lines.insert(1, format!("start: {start}s"));
    }
    Ok(lines.join("\n"))
}

/// Validate an upload against the default policy and name its object key.
///
/// # Errors
///
/// Returns [`AppError::Media`] when the policy rejects the file.
pub fn media_check(name: &str, content_type: &str, size_bytes: u64, id: Uuid) -> AppResult<String> {
    let file = UploadedFile {
        name: name.to_string(),
        content_type: content_type.to_string(),
        size_bytes,
        public_url: None,
    };
    let kind = UploadPolicy::default()
        .validate(&file)
        .map_err(|err| AppError::media("media.check", err))?;
    let path = storage_object_path(UPLOAD_PREFIX, &file.name, id);
    Ok(format!("{}: {path}", kind_label(kind)))
}

const fn kind_label(kind: UploadKind) -> &'static str {
    match kind {
        UploadKind::Image => "image",
        UploadKind::Video => "video",
        UploadKind::Document => "document",
    }
}

fn rejected(operation: &'static str, error: AuthError) -> AppError {
    AppError::AuthRejected {
        operation,
        message: error.message,
        code: error.code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use anyhow::Result;
    use folio_core::{
        AuthChangeEvent, JsonFileStore, LANGUAGE_STORAGE_KEY, MemoryStore, PreferenceStore,
    };
    use folio_test_support::{FakeIdentityProvider, sample_session, sample_user};
    use tokio::sync::oneshot;

    fn deps_with(provider: Arc<FakeIdentityProvider>) -> AppDependencies {
        AppDependencies::new(
            Arc::new(MemoryStore::with_entries([(LANGUAGE_STORAGE_KEY, "en")])),
            provider,
        )
    }

    #[tokio::test]
    async fn language_set_persists_to_file_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        let store = Arc::new(JsonFileStore::open(&path));
        let deps = AppDependencies::new(store, Arc::new(FakeIdentityProvider::new()));

        assert_eq!(language_set(&deps, "es")?, "Español (es)");
        let reopened = JsonFileStore::open(&path);
        assert_eq!(
            reopened.get(LANGUAGE_STORAGE_KEY)?,
            Some("es".to_string())
        );
        assert_eq!(deps.resolve_language().await?, LanguageCode::Es);
        Ok(())
    }

    #[test]
    fn language_set_rejects_region_tags() {
        let deps = AppDependencies::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FakeIdentityProvider::new()),
        );
        let err = language_set(&deps, "en-US").expect_err("unsupported code");
        assert!(matches!(err, AppError::InvalidArgument { field: "code", .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn language_show_uses_the_resolved_language() -> Result<()> {
        let deps = AppDependencies::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FakeIdentityProvider::new()),
        );
        assert_eq!(language_show(&deps).await?, "Idioma: Català (ca)");
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_reports_the_signed_in_email() -> Result<()> {
        let user = sample_user("editor@example.com");
        let provider = Arc::new(FakeIdentityProvider::new().with_account(user, "hunter22"));
        let deps = deps_with(Arc::clone(&provider));

        let message = sign_in(&deps, "editor@example.com", "hunter22").await?;
        assert_eq!(message, "Signed in as editor@example.com");
        assert_eq!(provider.sign_in_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_surfaces_provider_rejection() {
        let provider = Arc::new(FakeIdentityProvider::new());
        let deps = deps_with(provider);

        let err = sign_in(&deps, "nobody@example.com", "wrong")
            .await
            .expect_err("rejected credentials");
        assert!(matches!(
            err,
            AppError::AuthRejected {
                operation: "sign_in",
                ..
            }
        ));
        assert_eq!(err.display_message(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn sign_out_failure_is_reported() {
        let user = sample_user("editor@example.com");
        let provider = Arc::new(FakeIdentityProvider::new().with_session(sample_session(user)));
        provider.fail_sign_out(AuthError::new("upstream unavailable", Some(503), None));
        let deps = deps_with(Arc::clone(&provider));

        let err = sign_out(&deps).await.expect_err("sign-out failure");
        assert_eq!(err.display_message(), "upstream unavailable");
        assert_eq!(provider.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn whoami_reflects_the_session() -> Result<()> {
        let user = sample_user("owner@example.com");
        let provider = Arc::new(FakeIdentityProvider::new().with_session(sample_session(user)));
        assert_eq!(
            whoami(&deps_with(provider)).await?,
            "Signed in as owner@example.com"
        );

        let anonymous = Arc::new(FakeIdentityProvider::new());
        assert_eq!(whoami(&deps_with(anonymous)).await?, "Not signed in");
        Ok(())
    }

    #[tokio::test]
    async fn run_until_observes_transitions_and_unsubscribes() -> Result<()> {
        let provider = Arc::new(FakeIdentityProvider::new());
        let deps = deps_with(Arc::clone(&provider));
        let (stop, stopped) = oneshot::channel::<()>();

        let driver = Arc::clone(&provider);
        let trigger = tokio::spawn(async move {
            while driver.subscriber_count() == 0 {
                tokio::task::yield_now().await;
            }
            let user = sample_user("late@example.com");
            driver.emit(AuthChangeEvent::SignedIn, Some(sample_session(user)));
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let _ = stop.send(());
        });

        let summary = run_until(&deps, async move {
            let _ = stopped.await;
            Ok(())
        })
        .await?;
        trigger.await?;

        assert!(summary.starts_with("stopped after "));
        assert_eq!(provider.subscriber_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn run_until_reports_signal_errors() {
        let deps = deps_with(Arc::new(FakeIdentityProvider::new()));
        let err = run_until(&deps, async {
            Err(io::Error::other("signal handler unavailable"))
        })
        .await
        .expect_err("signal failure");
        assert!(matches!(err, AppError::Io { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn media_youtube_lists_urls() -> Result<()> {
        let output = media_youtube("https://youtu.be/dQw4w9WgXcQ?t=1m5s")?;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "id: dQw4w9WgXcQ");
        assert_eq!(lines[1], "start: 65s");
        assert_eq!(
            lines[2],
            "embed: https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ?start=65"
        );
        Ok(())
    }

    #[test]
    fn media_youtube_rejects_other_hosts() {
        let err = media_youtube("https://vimeo.com/123456").expect_err("unsupported host");
        assert!(matches!(err, AppError::Media { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn media_check_names_the_object() -> Result<()> {
        let id = Uuid::nil();
        assert_eq!(
            media_check("Hero Shot.JPG", "image/jpeg", 2048, id)?,
            format!("image: uploads/{id}-hero-shot.jpg")
        );
        let err = media_check("notes.exe", "application/x-msdownload", 10, id)
            .expect_err("disallowed type");
        assert!(matches!(err, AppError::Media { .. }));
        Ok(())
    }
}
