use anyhow::Context;
use clap::Parser;
use giftidea_core::form::{read_idea_request, FormMethod, RawIdeaForm};
use giftidea_core::service::IdeaGenerator;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Debug, Parser)]
#[command(name = "giftidea", about = "Ask an LLM provider for gift ideas")]
struct Args {
    /// Model id, e.g. gemini-2.0-flash or gpt-4o-mini. The provider is picked from it.
    #[arg(long)]
    model: Option<String>,

    /// API key of the provider hosting the model.
    #[arg(long, env = "GIFTIDEA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Age of the person (decimals are truncated).
    #[arg(long, allow_hyphen_values = true)]
    age: Option<String>,

    /// Interests of the person, free text.
    #[arg(long)]
    interests: Option<String>,

    /// Number of ideas to ask for.
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    count: String,

    /// Resolve the provider and print the prompts without calling the model.
    #[arg(long)]
    dry_run: bool,

    /// Print the ideas as JSON.
    #[arg(long)]
    json: bool,

    /// List the models of every provider, in resolution order, and exit.
    #[arg(long)]
    list_models: bool,
}

impl Args {
    fn raw_form(&self) -> RawIdeaForm {
        RawIdeaForm {
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            age: self.age.clone(),
            interests: self.interests.clone(),
            count: Some(self.count.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = giftidea_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let generator = IdeaGenerator::from_settings(&settings.llm);

    if args.list_models {
        let catalogs = generator
            .catalogs(args.api_key.as_deref().unwrap_or_default())
            .await?;
        print!("{}", output::render_catalogs(&catalogs));
        return Ok(());
    }

    let request = read_idea_request(FormMethod::Submit, &args.raw_form())?
        .context("submission produced no request")?;

    if args.dry_run {
        let preview = generator.preview(&request).await?;
        tracing::info!(
            provider = %preview.provider,
            model = %request.model,
            dry_run = true,
            "provider resolved; model not called"
        );
        print!("{}", output::render_preview(&preview));
        return Ok(());
    }

    match generator.generate_ideas(&request).await {
        Ok(ideas) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&ideas)?);
            } else {
                print!("{}", output::render_ideas(&ideas));
            }
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(model = %request.model, error = %err, "idea generation failed");
            Err(err)
        }
    }
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
