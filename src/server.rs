//! HTTP 服务装配：路由、中间件、静态资源、监听

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{error_handling::HandleErrorLayer, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::app::users::{
    handler::{self, AppState},
    service::UserService,
};
use crate::core::{
    config::AppConfig,
    middleware::{handle_middleware_error, panic_response, request_logging_middleware},
};
use crate::infrastructure::store::JsonFileStore;

/// API 路由前缀
pub const API_BASE: &str = "/api/users";

/// 构建完整路由
///
/// API 路由优先匹配，其余请求交给静态资源目录，`/` 返回入口页面。
pub fn build_router(config: &AppConfig, user_service: UserService) -> Router {
    let state = AppState { user_service };

    let api = Router::new()
        .route(
            API_BASE,
            get(handler::list_users).post(handler::create_user),
        )
        .route(
            &format!("{}/:id", API_BASE),
            get(handler::get_user)
                .put(handler::update_user)
                .delete(handler::delete_user),
        )
        .route("/health", get(handler::health_check))
        .with_state(state);

    Router::new()
        .merge(api)
        .route_service("/", ServeFile::new(config.index_file()))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(config.request_timeout)
                .layer(middleware::from_fn(request_logging_middleware)),
        )
}

/// 打开数据文件、绑定端口并开始服务
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&config.data_file)
        .await
        .with_context(|| format!("无法初始化数据文件 {}", config.data_file.display()))?;
    info!("📁 数据文件: {}", store.path().display());

    let user_service = UserService::new(Arc::new(store));
    let app = build_router(&config, user_service);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            error!("端口 {} 已被占用，请停止占用该端口的进程或设置 PORT 使用其他端口", config.port);
            error!("可以执行: lsof -ti:{} | xargs kill -9", config.port);
            return Err(e).context(format!("端口 {} 已被占用", config.port));
        }
        Err(e) => return Err(e).context(format!("无法绑定到 {}", addr)),
    };

    info!("🚀 服务器运行在 http://localhost:{}", config.port);
    info!("📖 API 端点:");
    info!("   GET    {}      - 获取所有用户", API_BASE);
    info!("   POST   {}      - 注册新用户", API_BASE);
    info!("   GET    {}/:id  - 获取特定用户", API_BASE);
    info!("   PUT    {}/:id  - 更新用户", API_BASE);
    info!("   DELETE {}/:id  - 删除用户", API_BASE);

    axum::serve(listener, app).await.context("服务器运行失败")?;
    Ok(())
}
