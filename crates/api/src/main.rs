use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use minijinja::{context, Environment};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use giftidea_core::domain::idea::Idea;
use giftidea_core::domain::request::IdeaRequest;
use giftidea_core::error::{GenerateError, ValidationError};
use giftidea_core::form::{read_idea_request, FormMethod, RawIdeaForm};
use giftidea_core::service::IdeaGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = giftidea_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState {
        generator: Arc::new(IdeaGenerator::from_settings(&settings.llm)),
        templates: Arc::new(build_templates()?),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    generator: Arc<IdeaGenerator>,
    templates: Arc<Environment<'static>>,
}

#[derive(Debug, Serialize)]
struct IdeaView {
    name: String,
    price: String,
}

impl From<&Idea> for IdeaView {
    fn from(idea: &Idea) -> Self {
        Self {
            name: idea.name.clone(),
            price: idea.formatted_price(),
        }
    }
}

#[derive(Debug)]
enum AppError {
    Validation(ValidationError),
    Generate(GenerateError),
    Render(minijinja::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        Self::Generate(err)
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Generate(GenerateError::UnavailableModel(_)) => StatusCode::BAD_REQUEST,
            AppError::Generate(_) => StatusCode::BAD_GATEWAY,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Validation(err) => err.to_string(),
            AppError::Generate(GenerateError::UnavailableModel(model)) => {
                format!("Le modèle spécifié n'est pas disponible : {model}")
            }
            AppError::Generate(GenerateError::MalformedResponse { .. })
            | AppError::Generate(GenerateError::Deserialization { .. }) => {
                "Le format de la réponse est invalide.".to_string()
            }
            AppError::Generate(GenerateError::Provider(_)) => {
                "Le fournisseur du modèle a renvoyé une erreur.".to_string()
            }
            AppError::Render(_) => "Erreur interne.".to_string(),
        }
    }

    fn report(&self) {
        match self {
            AppError::Validation(err) => {
                tracing::info!(field = err.field(), error = %err, "invalid submission");
            }
            AppError::Generate(GenerateError::Provider(err)) => {
                sentry_anyhow::capture_anyhow(err);
                tracing::error!(error = %format!("{err:#}"), "provider call failed");
            }
            AppError::Generate(err) => {
                sentry::capture_error(err);
                tracing::error!(error = %err, "idea generation failed");
            }
            AppError::Render(err) => {
                sentry::capture_error(err);
                tracing::error!(error = %err, "template rendering failed");
            }
        }
    }
}

async fn show_form(State(state): State<AppState>) -> Response {
    let page = read_idea_request(FormMethod::Read, &RawIdeaForm::default())
        .map_err(AppError::from)
        .and_then(|request| render_index(&state.templates, request.as_ref(), None));
    into_page(&state, page)
}

/// Any POST reaches the validator: a body that is not a url-encoded form is
/// treated as a form with no fields, and a repeated field keeps its last value.
async fn submit_form(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let span = tracing::info_span!("submission", request_id = %Uuid::new_v4());
    let form = match form {
        Ok(Form(pairs)) => RawIdeaForm::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(parent: &span, %rejection, "form body not decoded");
            RawIdeaForm::default()
        }
    };
    let page = handle_submission(&state, &form).instrument(span).await;
    into_page(&state, page)
}

async fn handle_submission(state: &AppState, form: &RawIdeaForm) -> Result<String, AppError> {
    let Some(request) = read_idea_request(FormMethod::Submit, form)? else {
        return render_index(&state.templates, None, None);
    };
    let ideas = state.generator.generate_ideas(&request).await?;
    render_index(&state.templates, Some(&request), Some(&ideas))
}

fn into_page(state: &AppState, page: Result<String, AppError>) -> Response {
    match page {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            err.report();
            let status = err.status();
            match render_error(&state.templates, status, &err.message()) {
                Ok(html) => (status, Html(html)).into_response(),
                Err(render_err) => {
                    tracing::error!(error = %render_err, "error page rendering failed");
                    status.into_response()
                }
            }
        }
    }
}

fn build_templates() -> anyhow::Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("index.html", include_str!("../templates/index.html"))?;
    env.add_template("error.html", include_str!("../templates/error.html"))?;
    Ok(env)
}

fn render_index(
    env: &Environment<'static>,
    idea_request: Option<&IdeaRequest>,
    ideas: Option<&[Idea]>,
) -> Result<String, AppError> {
    let ideas: Option<Vec<IdeaView>> = ideas.map(|ideas| ideas.iter().map(IdeaView::from).collect());
    let html = env.get_template("index.html")?.render(context! {
        idea_request => idea_request,
        ideas => ideas,
    })?;
    Ok(html)
}

fn render_error(
    env: &Environment<'static>,
    status: StatusCode,
    message: &str,
) -> Result<String, minijinja::Error> {
    env.get_template("error.html")?.render(context! {
        status => status.as_u16(),
        message => message,
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &giftidea_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftidea_core::llm::{
        MessageBag, ModelCatalog, ModelDescriptor, ModelResult, Platform, Provider,
        ProviderRegistry,
    };

    struct CannedPlatform {
        reply: &'static str,
    }

    #[async_trait::async_trait]
    impl Platform for CannedPlatform {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        async fn model_catalog(&self) -> anyhow::Result<ModelCatalog> {
            Ok(std::iter::once(ModelDescriptor {
                id: "test-model".to_string(),
                display_name: "Test".to_string(),
            })
            .collect())
        }

        async fn invoke(&self, _model: &str, _messages: &MessageBag) -> anyhow::Result<ModelResult> {
            Ok(ModelResult::new(self.reply.to_string(), serde_json::Value::Null))
        }
    }

    fn state(reply: &'static str) -> AppState {
        let registry = ProviderRegistry::new().with_provider(Provider::OpenAI, move |_key: &str| {
            Ok(Box::new(CannedPlatform { reply }) as Box<dyn Platform>)
        });
        AppState {
            generator: Arc::new(IdeaGenerator::new(registry)),
            templates: Arc::new(build_templates().unwrap()),
        }
    }

    fn form(model: &str) -> Vec<(String, String)> {
        [
            ("model", model),
            ("api-key", "sk-secret"),
            ("age", "31.5"),
            ("interests", "cuisine & vin"),
            ("count", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    async fn submit(state: AppState, pairs: Vec<(String, String)>) -> Response {
        submit_form(State(state), Ok(Form(pairs))).await
    }

    /// Serves the full router on an ephemeral port and returns its base URL.
    async fn spawn_app(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn blank_form_on_page_visit() {
        let res = show_form(State(state("[]"))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_text(res).await;
        assert!(body.contains("<form method=\"post\""));
        assert!(!body.contains("<h2>Idées</h2>"));
    }

    #[tokio::test]
    async fn submission_renders_ideas_in_order() {
        let reply = r#"Voici : [{"name":"Tablier","price":24.5},{"name":"Couteau <chef>","price":89}]"#;
        let res = submit(state(reply), form("test-model")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_text(res).await;

        let first = body.find("Tablier : 24.50 €").unwrap();
        let second = body.find("Couteau &lt;chef&gt; : 89.00 €").unwrap();
        assert!(first < second);
        assert!(body.contains("value=\"31\""));
        assert!(body.contains("cuisine &amp; vin"));
        assert!(!body.contains("sk-secret"));
    }

    #[tokio::test]
    async fn invalid_submission_is_bad_request() {
        let mut bad = form("test-model");
        bad.push(("age".to_string(), "old".to_string()));
        let res = submit(state("[]"), bad).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(res).await.contains("Age is required and must be a number."));
    }

    #[tokio::test]
    async fn unknown_model_is_bad_request() {
        let res = submit(state("[]"), form("other-model")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(res).await.contains("other-model"));
    }

    #[tokio::test]
    async fn malformed_reply_is_bad_gateway() {
        let res = submit(state("pas de JSON"), form("test-model")).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(res)
            .await
            .contains("Le format de la réponse est invalide."));
    }

    #[tokio::test]
    async fn post_without_form_body_reaches_the_validator() {
        let base = spawn_app(state("[]")).await;
        let res = reqwest::Client::new()
            .post(format!("{base}/"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
        assert!(res.text().await.unwrap().contains("Model is required"));
    }

    #[tokio::test]
    async fn repeated_form_fields_keep_the_last_value() {
        let base = spawn_app(state(r#"[{"name":"Tablier","price":24.5}]"#)).await;
        let res = reqwest::Client::new()
            .post(format!("{base}/"))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("model=other-model&model=test-model&api-key=k&age=31&interests=vin&count=1")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert!(res.text().await.unwrap().contains("Tablier : 24.50 €"));
    }
}
