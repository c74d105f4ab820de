//! Servidor web Axum com WebSocket para destaque de entidades clínicas em tempo real

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use askama::Template;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use clap::Parser;
use medner_core::{
    corpus::demo_texts,
    segment::combine_adjacent,
    ClinicalPipeline, EntityLabel, Gazetteer, GazetteerClassifier, PipelineConfig, PipelineEvent,
    TokenClassifier,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "medner-web")]
#[command(about = "Destaque de medicamentos, doenças e dosagens em notas clínicas")]
#[command(version)]
struct Args {
    /// Endereço de escuta
    #[arg(long, env = "MEDNER_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Gazetteer extra em JSON: {"chemicals": [...], "diseases": [...]}
    #[arg(long, env = "MEDNER_GAZETTEER")]
    gazetteer: Option<PathBuf>,

    /// Desliga o classificador (apenas padrões de dosagem)
    #[arg(long, env = "MEDNER_NO_MODEL")]
    no_model: bool,

    /// Score mínimo para aceitar uma predição do modelo
    #[arg(long, env = "MEDNER_MIN_SCORE", default_value_t = 0.0)]
    min_model_score: f64,

    /// Unidades de dosagem, separadas por vírgula (ordem importa)
    #[arg(long, env = "MEDNER_DOSAGE_UNITS", value_delimiter = ',')]
    dosage_units: Vec<String>,

    /// Pausa entre eventos enviados pelo WebSocket (animação passo a passo)
    #[arg(long, env = "MEDNER_WS_STEP_MS", default_value_t = 35)]
    ws_step_ms: u64,

    /// Filtro de logs no formato do `tracing-subscriber` (ex: "info,medner_core=debug")
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_filter: String,
}

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: ClinicalPipeline,
    ws_step: Duration,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
    /// Junta segmentos vizinhos de mesmo rótulo antes de responder
    #[serde(default)]
    combine_adjacent: bool,
}

/// Mensagem WebSocket recebida do cliente
#[derive(Deserialize)]
struct WsRequest {
    text: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_available: bool,
}

struct LegendItem {
    name: String,
    color: &'static str,
    icon: &'static str,
}

struct DemoText {
    domain: &'static str,
    text: &'static str,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    legend: Vec<LegendItem>,
    demos: Vec<DemoText>,
    model_available: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(&args.log_filter).unwrap_or_else(|_| "info".into()))
        .init();

    let classifier = load_classifier(&args);
    let mut config = PipelineConfig {
        min_model_score: args.min_model_score,
        ..PipelineConfig::default()
    };
    if !args.dosage_units.is_empty() {
        config.dosage_units = args.dosage_units.clone();
    }
    let pipeline = ClinicalPipeline::with_config(classifier, &config)
        .context("configuração de unidades de dosagem inválida")?;

    let state = Arc::new(AppState {
        pipeline,
        ws_step: Duration::from_millis(args.ws_step_ms),
    });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("não foi possível escutar em {}", args.addr))?;
    info!("🚀 Servidor MedNER iniciado em http://{}", args.addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Constrói o classificador. Falhas de carga não derrubam o servidor:
/// o pipeline segue em modo degradado, apenas com padrões.
fn load_classifier(args: &Args) -> Option<Arc<dyn TokenClassifier>> {
    if args.no_model {
        return None;
    }

    let mut gazetteer = Gazetteer::seed();
    if let Some(path) = &args.gazetteer {
        let loaded = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|json| Gazetteer::from_json(&json).map_err(anyhow::Error::from));
        match loaded {
            Ok(extra) => {
                info!(path = %path.display(), chemicals = extra.chemicals.len(), diseases = extra.diseases.len(), "gazetteer extra carregado");
                gazetteer.extend(extra);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "falha ao carregar gazetteer: seguindo sem modelo");
                return None;
            }
        }
    }

    let classifier = GazetteerClassifier::new(&gazetteer);
    info!(terms = classifier.len(), "classificador por gazetteer pronto");
    Some(Arc::new(classifier))
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Retorna a página principal HTML
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let legend = [EntityLabel::Chemical, EntityLabel::Disease, EntityLabel::Dosage]
        .into_iter()
        .map(|label| LegendItem {
            name: label.name().to_string(),
            color: label.color(),
            icon: label.icon(),
        })
        .collect();
    let demos = demo_texts()
        .into_iter()
        .map(|(domain, text)| DemoText { domain, text })
        .collect();

    let page = IndexTemplate {
        legend,
        demos,
        model_available: state.pipeline.model_available(),
    };
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(error = %e, "falha ao renderizar template");
            (StatusCode::INTERNAL_SERVER_ERROR, "erro ao renderizar página").into_response()
        }
    }
}

/// Análise via HTTP POST (sem streaming). Texto vazio é uma entrada válida.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let state_for_task = Arc::clone(&state);
    let text = req.text;
    let analysis = tokio::task::spawn_blocking(move || state_for_task.pipeline.analyze(&text)).await;

    match analysis {
        Ok(mut analysis) => {
            if req.combine_adjacent {
                analysis.segments = combine_adjacent(analysis.segments);
            }
            Json(analysis).into_response()
        }
        Err(e) => {
            warn!(error = %e, "tarefa de análise falhou");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "falha na análise"})),
            )
                .into_response()
        }
    }
}

/// Retorna notas de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(domain, text)| {
            serde_json::json!({
                "domain": domain,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        model_available: state.pipeline.model_available(),
    })
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Roda o pipeline síncrono fora do runtime e coleta os eventos, terminando em `Done`.
async fn collect_events(
    state: &Arc<AppState>,
    text: String,
) -> Result<Vec<PipelineEvent>, tokio::task::JoinError> {
    let (tx_std, rx_std) = std::sync::mpsc::channel::<PipelineEvent>();
    let pipeline_arc = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        pipeline_arc.pipeline.analyze_streaming(&text, tx_std);
    })
    .await?;
    Ok(rx_std.try_iter().collect())
}

/// Lógica do WebSocket: recebe texto, executa pipeline e envia eventos em tempo real
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // Tenta parsear como JSON {text}; senão usa como texto puro
                let text_str = match serde_json::from_str::<WsRequest>(&text) {
                    Ok(req) => req.text,
                    Err(_) => text.to_string(),
                };

                info!("Analisando via WebSocket: {} bytes", text_str.len());

                let events = match collect_events(&state, text_str).await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!(error = %e, "tarefa de análise falhou");
                        continue;
                    }
                };
                for event in &events {
                    let json = match serde_json::to_string(event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "falha ao serializar evento");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json)).await.is_err() {
                        return; // cliente desconectou
                    }
                    if !state.ws_step.is_zero() {
                        tokio::time::sleep(state.ws_step).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
