//! FaithConnect CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示 SDK 功能：登录或注册后装配客户端，
//! 拉取信息流/会话/通知，按参数执行关注、点赞、评论、发消息，
//! 然后持续监听实时事件

use anyhow::Result;
use clap::Parser;
use faithconnect_sdk_core_rust::fc::client::{ClientConfig, FaithConnectClient};
use faithconnect_sdk_core_rust::fc::follow::FollowListener;
use faithconnect_sdk_core_rust::fc::message::{Message, MessageListener};
use faithconnect_sdk_core_rust::fc::notification::{Notification, NotificationListener};
use faithconnect_sdk_core_rust::fc::post::PostListener;
use faithconnect_sdk_core_rust::fc::profile::{NewProfile, UserRole};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// FaithConnect CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "faithconnect-cli")]
#[command(about = "FaithConnect CLI 客户端 - 用于测试和展示 SDK 功能", long_about = None)]
struct Args {
    /// 服务端点
    #[arg(long, default_value = "https://cloud.appwrite.io/v1")]
    endpoint: String,

    /// 项目 ID
    #[arg(long, default_value = "faithconnect")]
    project: String,

    /// 登录邮箱
    #[arg(short, long, default_value = "demo@faithconnect.app")]
    email: String,

    /// 登录密码
    #[arg(short, long, default_value = "faithconnect-demo")]
    password: String,

    /// 注册新账号（注册后自动创建档案）
    #[arg(long)]
    register: bool,

    /// 注册时的档案角色：worshiper 或 leader
    #[arg(long, default_value = "worshiper")]
    role: String,

    /// 关注/取关该领袖（档案 ID）
    #[arg(long)]
    follow: Option<String>,

    /// 点赞/取消点赞该帖子（文档 ID）
    #[arg(long)]
    like: Option<String>,

    /// 评论该帖子（文档 ID，内容取 --text）
    #[arg(long)]
    comment: Option<String>,

    /// 给该领袖发消息（档案 ID，内容取 --text）
    #[arg(long)]
    message: Option<String>,

    /// 评论与消息的文本内容
    #[arg(long, default_value = "Hello from faithconnect-cli")]
    text: String,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,faithconnect_sdk_core_rust=debug）
    #[arg(long, default_value = "info,faithconnect_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 截断展示文本，避免长帖撑爆日志行（按字符截断，不在多字节中间切）
fn preview(text: &str) -> &str {
    match text.char_indices().nth(40) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 设置监听器（输出所有接收到的事件）
fn setup_listeners(client: &mut FaithConnectClient) {
    // 帖子监听器
    struct CliPostListener;
    #[async_trait::async_trait]
    impl PostListener for CliPostListener {
        async fn on_feed_changed(&self) {
            info!("[CLI/Post] 🔄 信息流已变更");
        }

        async fn on_post_changed(&self, post_id: String) {
            info!("[CLI/Post] 🔄 帖子状态变更: {}", post_id);
        }

        async fn on_like_failed(&self, post_id: String, error: String) {
            error!("[CLI/Post] ❌ 点赞失败（已回滚）: {} | {}", post_id, error);
        }

        async fn on_comment_failed(&self, post_id: String, error: String) {
            error!("[CLI/Post] ❌ 评论失败（已回滚）: {} | {}", post_id, error);
        }
    }
    client.set_post_listener(Arc::new(CliPostListener));

    // 关注监听器
    struct CliFollowListener;
    #[async_trait::async_trait]
    impl FollowListener for CliFollowListener {
        async fn on_follow_state_changed(&self, leader_id: String, following: bool) {
            info!(
                "[CLI/Follow] {} 领袖 {} 关注状态: {}",
                if following { "➕" } else { "➖" },
                leader_id,
                following
            );
        }

        async fn on_follow_list_changed(&self) {
            info!("[CLI/Follow] 🔄 关注列表已变更");
        }

        async fn on_toggle_failed(&self, leader_id: String, error: String) {
            error!("[CLI/Follow] ❌ 关注切换失败（已回滚）: {} | {}", leader_id, error);
        }
    }
    client.set_follow_listener(Arc::new(CliFollowListener));

    // 消息监听器
    struct CliMessageListener;
    #[async_trait::async_trait]
    impl MessageListener for CliMessageListener {
        async fn on_new_message(&self, message: Message) {
            info!(
                "[CLI/Message] 📨 收到新消息: 会话 {} | 发送者 {} | {}",
                message.chat.id(),
                message.sender.id(),
                message.text
            );
        }

        async fn on_send_failed(&self, chat_id: String, error: String) {
            error!("[CLI/Message] ❌ 发送失败: {} | {}", chat_id, error);
        }
    }
    client.set_message_listener(Arc::new(CliMessageListener));

    // 通知监听器
    struct CliNotificationListener;
    #[async_trait::async_trait]
    impl NotificationListener for CliNotificationListener {
        async fn on_new_notification(&self, notification: Notification) {
            info!(
                "[CLI/Notification] 🔔 新通知: {} | 来自 {} | {}",
                notification.kind.as_str(),
                notification
                    .from
                    .as_ref()
                    .map(|f| f.id().to_string())
                    .unwrap_or_else(|| "系统".to_string()),
                notification.text
            );
        }
    }
    client.set_notification_listener(Arc::new(CliNotificationListener));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 FaithConnect CLI 客户端（测试模式）");
    info!("[CLI] 🌐 端点: {} | 项目: {}", args.endpoint, args.project);
    info!("[CLI] 📧 邮箱: {}", args.email);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    let config = ClientConfig::new(&args.endpoint, &args.project);
    let mut client = FaithConnectClient::new(config);

    // 设置监听器（connect 前）
    setup_listeners(&mut client);

    // 登录或注册；非注册模式先尝试恢复本地会话
    if args.register {
        info!("[CLI] 🆕 正在注册新账号...");
        client.register(&args.email, &args.password).await?;
    } else {
        match client.restore_session().await? {
            Some(_) => info!("[CLI] ♻️  已恢复本地会话"),
            None => {
                info!("[CLI] 🔐 正在登录...");
                client.login(&args.email, &args.password).await?;
            }
        }
    }
    let account = client
        .account()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("登录后未拿到账号信息"))?;
    info!("[CLI] ✅ 已登录！账号ID: {}", account.id);

    // 连接：装配服务并订阅实时通道
    info!("[CLI] 🔗 正在连接服务器...");
    client.connect().await?;
    info!("[CLI] ✅ 连接成功！");

    // 加载档案；注册模式下没有档案就按参数角色创建一个
    match client.profile()?.load_profile(&account.id).await {
        Ok(profile) => info!(
            "[CLI] 👤 当前档案: {} ({})",
            profile.name,
            profile.role.as_str()
        ),
        Err(e) if args.register => {
            warn!("[CLI] 档案不存在（{:?}），执行角色设置...", e);
            let role = match args.role.as_str() {
                "leader" => UserRole::Leader,
                _ => UserRole::Worshiper,
            };
            let name = args
                .email
                .split('@')
                .next()
                .unwrap_or("believer")
                .to_string();
            let profile = client
                .profile()?
                .setup_profile(
                    &account.id,
                    NewProfile {
                        name,
                        role,
                        faith: "Christianity".to_string(),
                        bio: None,
                    },
                )
                .await?;
            info!(
                "[CLI] ✅ 档案已创建: {} ({})",
                profile.name,
                profile.role.as_str()
            );
        }
        Err(e) => warn!("[CLI] ⚠️ 档案加载失败（需要先完成角色设置）: {:?}", e),
    }

    // 显示初始信息：先回放缓存快照，再做权威拉取
    client.posts()?.load_cached_feeds().await;
    match client.posts()?.load_explore_feed().await {
        Ok(posts) => {
            info!("[CLI] 📋 发现页信息流（共 {} 条）:", posts.len());
            for post in posts.iter().take(3) {
                info!(
                    "[CLI]   - {} | 👍 {} | 💬 {} | {}",
                    post.id,
                    post.likes_count,
                    post.comments_count,
                    preview(post.text.as_deref().unwrap_or("<无文本>"))
                );
            }
        }
        Err(e) => warn!("[CLI] ⚠️ 发现页加载失败: {:?}", e),
    }
    match client.posts()?.load_reels_feed().await {
        Ok(reels) => info!("[CLI] 🎬 短视频信息流（共 {} 条）", reels.len()),
        Err(e) => warn!("[CLI] ⚠️ 短视频加载失败: {:?}", e),
    }

    if let Ok(leaders) = client.follows()?.load_my_leaders().await {
        info!("[CLI] ⭐ 我关注的领袖（共 {} 个）", leaders.len());
    }

    if let Ok(chats) = client.chats()?.list_my_chats().await {
        info!("[CLI] 💬 会话列表（共 {} 个）:", chats.len());
        for chat in chats.iter().take(3) {
            info!(
                "[CLI]   - {} | 最新: {}",
                chat.id,
                preview(chat.last_message.as_deref().unwrap_or("<暂无消息>"))
            );
        }
    }

    if let Ok(notifications) = client.notifications()?.load_notifications().await {
        info!("[CLI] 🔔 通知（共 {} 条）", notifications.len());
    }
    if let Ok(unread) = client.notifications()?.unread_count().await {
        info!("[CLI] 📬 未读通知数: {}", unread);
    }

    // 按参数执行动作
    if let Some(leader_id) = &args.follow {
        info!("[CLI] ⭐ 切换关注: {}", leader_id);
        client.follows()?.toggle_follow(leader_id).await;
        info!(
            "[CLI]   当前关注状态: {}",
            client.follows()?.is_followed(leader_id)
        );
    }

    if let Some(post_id) = &args.like {
        info!("[CLI] 👍 切换点赞: {}", post_id);
        // 先拉详情进本地状态，切换才有作用对象
        if let Err(e) = client.posts()?.load_post(post_id).await {
            warn!("[CLI] ⚠️ 帖子详情加载失败: {:?}", e);
        } else {
            client.likes()?.toggle_like(post_id).await;
            info!(
                "[CLI]   当前点赞状态: {}",
                client.likes()?.is_liked(post_id).await
            );
        }
    }

    if let Some(post_id) = &args.comment {
        info!("[CLI] 💬 发表评论: {} | {}", post_id, args.text);
        if let Err(e) = client.posts()?.load_post(post_id).await {
            warn!("[CLI] ⚠️ 帖子详情加载失败: {:?}", e);
        } else {
            client.comments()?.add_comment(post_id, &args.text).await;
        }
    }

    if let Some(leader_id) = &args.message {
        info!("[CLI] ✉️  给领袖发消息: {} | {}", leader_id, args.text);
        match client.chats()?.start_chat(leader_id).await {
            Ok(started) => {
                info!(
                    "[CLI]   会话 {} （来源: {:?}）",
                    started.chat_id, started.source
                );
                client
                    .messages()?
                    .send_message(&started.chat_id, &args.text)
                    .await;
            }
            Err(e) => warn!("[CLI] ⚠️ 发起聊天失败: {:?}", e),
        }
    }

    info!("[CLI] 📥 开始监听实时事件...");
    info!("[CLI] 💡 提示：程序将持续运行并显示收到的新消息和通知");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        client.logout().await?;
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        // 持续运行直到被中断
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
