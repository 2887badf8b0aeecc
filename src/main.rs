use doc_editor_rust::config::PersistenceMode;
use doc_editor_rust::models::{CustomerItem, ProductItem};
use doc_editor_rust::service::{
    LookupService, PersistenceAdapter, PgCustomerLookup, PgPersistence, PgProductLookup,
    RestLookup, RestPersistence,
};
use doc_editor_rust::{build_router, create_pool, AppConfig, AppState, SessionRegistry};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // 单据保存与查询服务：REST 后端或直连数据库
    let (persistence, products, customers): (
        Arc<dyn PersistenceAdapter>,
        Arc<dyn LookupService<ProductItem>>,
        Arc<dyn LookupService<CustomerItem>>,
    ) = match config.persistence {
        PersistenceMode::Rest => {
            let rest =
                RestPersistence::new(&config.backend.base_url, config.backend.timeout())?;
            let client = rest.client();
            info!("Using REST backend at {}", config.backend.base_url);
            (
                Arc::new(rest),
                Arc::new(RestLookup::<ProductItem>::with_client(
                    client.clone(),
                    &config.backend.base_url,
                    "products",
                )),
                Arc::new(RestLookup::<CustomerItem>::with_client(
                    client,
                    &config.backend.base_url,
                    "customers",
                )),
            )
        }
        PersistenceMode::Postgres => {
            let pool = create_pool(&config.database)?;
            info!("Database pool created");
            (
                Arc::new(PgPersistence::new(pool.clone(), config.backend.timeout())),
                Arc::new(PgProductLookup::new(pool.clone())),
                Arc::new(PgCustomerLookup::new(pool)),
            )
        }
    };

    let state = AppState {
        sessions: Arc::new(SessionRegistry::new(products, customers, config.search.clone())),
        persistence,
    };

    let app = build_router(state).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/sessions                 - open editor session");
    info!("  POST /api/sessions/:id/save        - add or update line");
    info!("  GET  /api/sessions/:id/products    - product search (latest wins)");
    info!("  POST /api/sessions/:id/submit      - create/update document");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
