//! FaithConnect 客户端门面
//!
//! 配置、认证、服务装配与实时订阅的统一入口。使用顺序：
//! `new` → 注册监听器 → `login`/`register`/`restore_session` → `connect`，
//! 之后通过各服务访问器操作；`logout` 做远端注销与本地清理。
//!
//! 客户端可克隆，克隆共享同一份连接态（状态仓库、服务、
//! WebSocket 写半边都在 Arc 里）。

use crate::fc::auth::{self, Account, Session};
use crate::fc::chat::{ChatApi, ChatCacheDao, ChatService};
use crate::fc::comment::{CommentApi, CommentService};
use crate::fc::databases::{DatabasesApi, DocumentService};
use crate::fc::db::create_sqlite_pool_with_migration;
use crate::fc::follow::{EmptyFollowListener, FollowApi, FollowListener, FollowService};
use crate::fc::kv::{keys, KvStore};
use crate::fc::like::{LikeApi, LikeService};
use crate::fc::message::{EmptyMessageListener, MessageApi, MessageListener, MessageService};
use crate::fc::notification::{
    EmptyNotificationListener, NotificationApi, NotificationListener, NotificationService,
};
use crate::fc::post::{EmptyPostListener, PostApi, PostListener, PostService};
use crate::fc::profile::{CurrentUser, ProfileApi, ProfileService};
use crate::fc::realtime::{
    build_realtime_url, collection_channel, RealtimeMessage, HEARTBEAT_INTERVAL,
};
use crate::fc::storage::{MediaService, StorageApi};
use crate::fc::store::{FollowStore, PostStore};
use anyhow::{anyhow, Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// WebSocket 写半边
type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
/// WebSocket 读半边
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// 远端集合 ID 配置
#[derive(Debug, Clone)]
pub struct CollectionIds {
    pub users_profile: String,
    pub posts: String,
    pub follows: String,
    pub likes: String,
    pub comments: String,
    pub chats: String,
    pub messages: String,
    pub notifications: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            users_profile: "users_profile".to_string(),
            posts: "posts".to_string(),
            follows: "follows".to_string(),
            likes: "likes".to_string(),
            comments: "comments".to_string(),
            chats: "chats".to_string(),
            messages: "messages".to_string(),
            notifications: "notifications".to_string(),
        }
    }
}

/// 存储桶 ID 配置
#[derive(Debug, Clone)]
pub struct BucketIds {
    pub profile_photos: String,
    pub post_media: String,
    pub reels_media: String,
}

impl Default for BucketIds {
    fn default() -> Self {
        Self {
            profile_photos: "profile_photos".to_string(),
            post_media: "post_media".to_string(),
            reels_media: "reels_media".to_string(),
        }
    }
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST 端点，如 `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    /// 项目 ID
    pub project_id: String,
    /// 数据库 ID
    pub database_id: String,
    /// 集合 ID
    pub collections: CollectionIds,
    /// 存储桶 ID
    pub buckets: BucketIds,
    /// 本地缓存库连接串
    pub local_store_path: String,
    /// 本地缓存条目最大可信时长；None 表示永不过期
    pub cache_max_age: Option<Duration>,
}

impl ClientConfig {
    /// 创建配置，其余字段取默认值
    pub fn new(endpoint: &str, project_id: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            database_id: "faithconnect_db".to_string(),
            collections: CollectionIds::default(),
            buckets: BucketIds::default(),
            local_store_path: "sqlite://faithconnect_local.db?mode=rwc".to_string(),
            cache_max_age: None,
        }
    }

    /// 实时订阅端点：REST 端点换成 ws(s) scheme 再加 `/realtime`
    pub fn realtime_endpoint(&self) -> String {
        let ws = if let Some(rest) = self.endpoint.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.endpoint.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.endpoint.clone()
        };
        format!("{}/realtime", ws)
    }
}

/// FaithConnect 客户端
#[derive(Clone)]
pub struct FaithConnectClient {
    config: ClientConfig,

    // 登录态
    session: Option<Session>,
    account: Option<Account>,

    // 本地缓存库（首次需要时打开）
    db: Option<Pool<Sqlite>>,
    kv: Option<KvStore>,

    // 内存状态仓库，归本客户端实例所有，登出时清空
    post_store: Arc<PostStore>,
    follow_store: Arc<FollowStore>,

    // 连接态（connect 之后可用）
    current_user: Option<CurrentUser>,
    profile_service: Option<Arc<ProfileService>>,
    post_service: Option<Arc<PostService>>,
    like_service: Option<Arc<LikeService>>,
    comment_service: Option<Arc<CommentService>>,
    follow_service: Option<Arc<FollowService>>,
    chat_service: Option<Arc<ChatService>>,
    message_service: Option<Arc<MessageService>>,
    notification_service: Option<Arc<NotificationService>>,
    media_service: Option<MediaService>,
    ws_writer: Option<Arc<Mutex<WsWriter>>>,

    // 监听器，connect 前注册
    post_listener: Arc<dyn PostListener>,
    follow_listener: Arc<dyn FollowListener>,
    message_listener: Arc<dyn MessageListener>,
    notification_listener: Arc<dyn NotificationListener>,
}

impl FaithConnectClient {
    /// 创建客户端（未登录、未连接）
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
            account: None,
            db: None,
            kv: None,
            post_store: Arc::new(PostStore::new()),
            follow_store: Arc::new(FollowStore::new()),
            current_user: None,
            profile_service: None,
            post_service: None,
            like_service: None,
            comment_service: None,
            follow_service: None,
            chat_service: None,
            message_service: None,
            notification_service: None,
            media_service: None,
            ws_writer: None,
            post_listener: Arc::new(EmptyPostListener),
            follow_listener: Arc::new(EmptyFollowListener),
            message_listener: Arc::new(EmptyMessageListener),
            notification_listener: Arc::new(EmptyNotificationListener),
        }
    }

    /// 当前配置
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 注册帖子监听器（信息流/详情变化、点赞评论失败回调）；connect 前调用
    pub fn set_post_listener(&mut self, listener: Arc<dyn PostListener>) {
        self.post_listener = listener;
    }

    /// 注册关注监听器；connect 前调用
    pub fn set_follow_listener(&mut self, listener: Arc<dyn FollowListener>) {
        self.follow_listener = listener;
    }

    /// 注册消息监听器（实时新消息、发送失败回调）；connect 前调用
    pub fn set_message_listener(&mut self, listener: Arc<dyn MessageListener>) {
        self.message_listener = listener;
    }

    /// 注册通知监听器；connect 前调用
    pub fn set_notification_listener(&mut self, listener: Arc<dyn NotificationListener>) {
        self.notification_listener = listener;
    }

    // ---- 认证 ----

    /// 邮箱密码登录；成功后缓存会话与账号快照
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session> {
        let session =
            auth::login_async(&self.config.endpoint, &self.config.project_id, email, password)
                .await?;
        let account =
            auth::get_account(&self.config.endpoint, &self.config.project_id, &session.secret)
                .await?;
        self.remember_login(session.clone(), account).await?;
        Ok(session)
    }

    /// 注册新账号并直接登录
    pub async fn register(&mut self, email: &str, password: &str) -> Result<Session> {
        let session =
            auth::register_async(&self.config.endpoint, &self.config.project_id, email, password)
                .await?;
        let account =
            auth::get_account(&self.config.endpoint, &self.config.project_id, &session.secret)
                .await?;
        self.remember_login(session.clone(), account).await?;
        Ok(session)
    }

    /// 冷启动恢复会话：本地快照存在且远端校验通过才算恢复成功
    pub async fn restore_session(&mut self) -> Result<Option<Session>> {
        let kv = self.local_kv().await?;
        let Some(session) = kv.get::<Session>(keys::USER_SESSION).await else {
            debug!("[Client] 本地无会话快照，跳过恢复");
            return Ok(None);
        };

        match auth::get_account(&self.config.endpoint, &self.config.project_id, &session.secret)
            .await
        {
            Ok(account) => {
                info!("[Client] ✅ 本地会话仍然有效，已恢复: {}", account.id);
                self.remember_login(session.clone(), account).await?;
                Ok(Some(session))
            }
            Err(e) => {
                warn!("[Client] ⚠️ 本地会话已失效，清除快照: {:?}", e);
                let _ = kv.remove(keys::USER_SESSION).await;
                let _ = kv.remove(keys::USER_INFO).await;
                Ok(None)
            }
        }
    }

    /// 当前登录会话
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// 当前登录账号
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    /// 登录成功后的本地登记：内存会话 + 键值快照
    async fn remember_login(&mut self, session: Session, account: Account) -> Result<()> {
        let kv = self.local_kv().await?;
        kv.set_best_effort(keys::USER_SESSION, &session).await;
        kv.set_best_effort(keys::USER_INFO, &account).await;
        self.session = Some(session);
        self.account = Some(account);
        Ok(())
    }

    /// 本地缓存库与键值缓存，首次调用时打开并跑迁移
    async fn local_kv(&mut self) -> Result<KvStore> {
        if let Some(kv) = &self.kv {
            return Ok(kv.clone());
        }
        let pool = create_sqlite_pool_with_migration(&self.config.local_store_path)
            .await
            .context("打开本地缓存库失败")?;
        let kv = KvStore::new(pool.clone(), self.config.cache_max_age);
        self.db = Some(pool);
        self.kv = Some(kv.clone());
        Ok(kv)
    }

    // ---- 连接 ----

    /// 建立连接：装配全部服务并订阅实时通道
    ///
    /// 前置条件是已登录（login / register / restore_session 任一成功）。
    /// 实时订阅覆盖消息与通知两个集合的新建事件。
    pub async fn connect(&mut self) -> Result<()> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| anyhow!("未登录，无法建立连接"))?;

        info!(
            "[Client] 🔌 正在连接 FaithConnect 服务: {}",
            self.config.endpoint
        );

        // 带项目与会话请求头的 HTTP 客户端，后续全部 REST 调用共用
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&self.config.project_id).context("项目 ID 不是合法请求头值")?,
        );
        headers.insert(
            "X-Appwrite-Session",
            HeaderValue::from_str(&session.secret).context("会话密钥不是合法请求头值")?,
        );
        let http = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .context("构建 HTTP 客户端失败")?;

        let kv = self.local_kv().await?;
        let db = self
            .db
            .clone()
            .ok_or_else(|| anyhow!("本地缓存库未初始化"))?;

        let databases: Arc<dyn DocumentService> = Arc::new(DatabasesApi::new(
            http.clone(),
            self.config.endpoint.clone(),
            self.config.database_id.clone(),
        ));
        let storage = StorageApi::new(
            http.clone(),
            self.config.endpoint.clone(),
            self.config.project_id.clone(),
        );

        // 服务装配：每个服务显式持有当前用户句柄
        let current_user = CurrentUser::new(kv.clone());
        let cols = self.config.collections.clone();

        let profile = Arc::new(ProfileService::new(
            ProfileApi::new(databases.clone(), cols.users_profile.clone()),
            kv.clone(),
            current_user.clone(),
        ));
        let posts = Arc::new(PostService::new(
            PostApi::new(databases.clone(), cols.posts.clone()),
            self.post_store.clone(),
            kv.clone(),
            current_user.clone(),
            self.post_listener.clone(),
        ));
        let likes = Arc::new(LikeService::new(
            LikeApi::new(databases.clone(), cols.likes.clone(), cols.posts.clone()),
            self.post_store.clone(),
            current_user.clone(),
            self.post_listener.clone(),
        ));
        let comments = Arc::new(CommentService::new(
            CommentApi::new(databases.clone(), cols.comments.clone()),
            NotificationApi::new(databases.clone(), cols.notifications.clone()),
            self.post_store.clone(),
            current_user.clone(),
            self.post_listener.clone(),
        ));
        let follows = Arc::new(FollowService::new(
            FollowApi::new(databases.clone(), cols.follows.clone()),
            NotificationApi::new(databases.clone(), cols.notifications.clone()),
            self.follow_store.clone(),
            current_user.clone(),
            self.follow_listener.clone(),
        ));
        let chats = Arc::new(ChatService::new(
            ChatApi::new(databases.clone(), cols.chats.clone()),
            ChatCacheDao::new(db, self.config.cache_max_age),
            current_user.clone(),
        ));
        let messages = Arc::new(MessageService::new(
            MessageApi::new(databases.clone(), cols.messages.clone()),
            ChatApi::new(databases.clone(), cols.chats.clone()),
            current_user.clone(),
            self.message_listener.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(
            NotificationApi::new(databases.clone(), cols.notifications.clone()),
            current_user.clone(),
            self.notification_listener.clone(),
        ));
        let media = MediaService::new(
            storage,
            self.config.buckets.profile_photos.clone(),
            self.config.buckets.post_media.clone(),
            self.config.buckets.reels_media.clone(),
        );

        // 实时订阅：消息与通知集合的文档事件
        let channels = vec![
            collection_channel(&self.config.database_id, &cols.messages),
            collection_channel(&self.config.database_id, &cols.notifications),
        ];
        let url = build_realtime_url(
            &self.config.realtime_endpoint(),
            &self.config.project_id,
            &channels,
        );
        debug!("[Client] 实时订阅 URL: {}", url);

        let (ws_stream, _) = connect_async(&url).await.context("实时通道建连失败")?;
        info!("[Client] ✅ 实时通道已建立");

        let (write, read) = ws_stream.split();
        let writer = Arc::new(Mutex::new(write));

        // 心跳：空闲时保持实时连接存活
        let heartbeat_writer = writer.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                ticker.tick().await;
                let mut w = heartbeat_writer.lock().await;
                if let Err(e) = w.send(WsMessage::Ping(vec![])).await {
                    warn!("[Client] ⚠️ 心跳发送失败，停止心跳: {:?}", e);
                    break;
                }
                debug!("[Client] 💓 已发送心跳");
            }
        });

        self.current_user = Some(current_user);
        self.profile_service = Some(profile);
        self.post_service = Some(posts);
        self.like_service = Some(likes);
        self.comment_service = Some(comments);
        self.follow_service = Some(follows);
        self.chat_service = Some(chats);
        self.message_service = Some(messages);
        self.notification_service = Some(notifications);
        self.media_service = Some(media);
        self.ws_writer = Some(writer);

        // 读循环：接收并分发实时事件
        let client = self.clone();
        tokio::spawn(async move {
            client.realtime_loop(read).await;
        });

        info!("[Client] ✅ 客户端装配完成");
        Ok(())
    }

    /// 实时读循环：解析文本帧并把新建事件分发给对应服务
    async fn realtime_loop(&self, mut read: WsReader) {
        let (Some(messages), Some(notifications)) = (
            self.message_service.clone(),
            self.notification_service.clone(),
        ) else {
            return;
        };
        let message_channel =
            collection_channel(&self.config.database_id, &self.config.collections.messages);
        let notification_channel = collection_channel(
            &self.config.database_id,
            &self.config.collections.notifications,
        );

        while let Some(frame) = read.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    let Some(msg) = RealtimeMessage::parse(&text) else {
                        continue;
                    };
                    match msg.msg_type.as_str() {
                        "connected" => info!("[Client] ✅ 实时通道握手完成"),
                        "error" => warn!("[Client] ⚠️ 实时通道错误帧: {:?}", msg.data),
                        "event" => {
                            let Some(event) = msg.event() else {
                                continue;
                            };
                            if !event.is_create() {
                                continue;
                            }
                            if event.on_channel(&message_channel) {
                                messages.handle_realtime_create(event.payload).await;
                            } else if event.on_channel(&notification_channel) {
                                notifications.handle_realtime_create(event.payload).await;
                            }
                        }
                        other => debug!("[Client] 忽略实时帧类型: {}", other),
                    }
                }
                Ok(WsMessage::Ping(data)) => {
                    if let Some(writer) = &self.ws_writer {
                        let mut w = writer.lock().await;
                        let _ = w.send(WsMessage::Pong(data)).await;
                    }
                }
                Ok(WsMessage::Pong(_)) => debug!("[Client] 💓 收到心跳响应"),
                Ok(WsMessage::Close(frame)) => {
                    info!("[Client] 实时通道已关闭: {:?}", frame);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("[Client] ⚠️ 实时连接错误，读循环退出: {:?}", e);
                    break;
                }
            }
        }
        info!("[Client] 实时读循环结束");
    }

    // ---- 服务访问器 ----

    /// 用户档案服务
    pub fn profile(&self) -> Result<Arc<ProfileService>> {
        self.profile_service
            .clone()
            .ok_or_else(|| anyhow!("档案服务未初始化，请先调用 connect()"))
    }

    /// 帖子服务
    pub fn posts(&self) -> Result<Arc<PostService>> {
        self.post_service
            .clone()
            .ok_or_else(|| anyhow!("帖子服务未初始化，请先调用 connect()"))
    }

    /// 点赞服务
    pub fn likes(&self) -> Result<Arc<LikeService>> {
        self.like_service
            .clone()
            .ok_or_else(|| anyhow!("点赞服务未初始化，请先调用 connect()"))
    }

    /// 评论服务
    pub fn comments(&self) -> Result<Arc<CommentService>> {
        self.comment_service
            .clone()
            .ok_or_else(|| anyhow!("评论服务未初始化，请先调用 connect()"))
    }

    /// 关注服务
    pub fn follows(&self) -> Result<Arc<FollowService>> {
        self.follow_service
            .clone()
            .ok_or_else(|| anyhow!("关注服务未初始化，请先调用 connect()"))
    }

    /// 会话服务
    pub fn chats(&self) -> Result<Arc<ChatService>> {
        self.chat_service
            .clone()
            .ok_or_else(|| anyhow!("会话服务未初始化，请先调用 connect()"))
    }

    /// 消息服务
    pub fn messages(&self) -> Result<Arc<MessageService>> {
        self.message_service
            .clone()
            .ok_or_else(|| anyhow!("消息服务未初始化，请先调用 connect()"))
    }

    /// 通知服务
    pub fn notifications(&self) -> Result<Arc<NotificationService>> {
        self.notification_service
            .clone()
            .ok_or_else(|| anyhow!("通知服务未初始化，请先调用 connect()"))
    }

    /// 媒体服务
    pub fn media(&self) -> Result<MediaService> {
        self.media_service
            .clone()
            .ok_or_else(|| anyhow!("媒体服务未初始化，请先调用 connect()"))
    }

    /// 当前登录用户句柄
    pub fn current_user(&self) -> Result<CurrentUser> {
        self.current_user
            .clone()
            .ok_or_else(|| anyhow!("客户端未连接，请先调用 connect()"))
    }

    // ---- 登出 ----

    /// 登出：远端注销会话，关闭实时连接，清空本地缓存与内存状态
    pub async fn logout(&mut self) -> Result<()> {
        info!("[Client] 👋 正在登出...");

        if let Some(session) = &self.session {
            if let Err(e) = auth::logout_async(
                &self.config.endpoint,
                &self.config.project_id,
                &session.secret,
            )
            .await
            {
                warn!("[Client] ⚠️ 远端注销失败（继续本地清理）: {:?}", e);
            }
        }

        if let Some(writer) = &self.ws_writer {
            let mut w = writer.lock().await;
            let _ = w.send(WsMessage::Close(None)).await;
        }

        if let Some(chats) = &self.chat_service {
            chats.clear_local_cache().await;
        }
        if let Some(kv) = &self.kv {
            if let Err(e) = kv.clear().await {
                warn!("[Client] ⚠️ 清空键值缓存失败: {:?}", e);
            }
        }
        if let Some(current_user) = &self.current_user {
            current_user.set(None);
        }
        self.post_store.clear();
        self.follow_store.clear();

        self.session = None;
        self.account = None;
        self.current_user = None;
        self.profile_service = None;
        self.post_service = None;
        self.like_service = None;
        self.comment_service = None;
        self.follow_service = None;
        self.chat_service = None;
        self.message_service = None;
        self.notification_service = None;
        self.media_service = None;
        self.ws_writer = None;

        info!("[Client] ✅ 已登出");
        Ok(())
    }
}
