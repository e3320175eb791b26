//! 会话服务层
//!
//! "发起聊天"按 缓存 → 远端查重 → 远端新建 三级推进，
//! 每一级命中都把会话 ID 写回本地查找表，下次直接本地命中。

use crate::fc::chat::api::ChatApi;
use crate::fc::chat::dao::ChatCacheDao;
use crate::fc::chat::models::{Chat, ChatSource, StartedChat};
use crate::fc::profile::service::CurrentUser;
use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

/// 会话服务
pub struct ChatService {
    api: ChatApi,
    dao: ChatCacheDao,
    current_user: CurrentUser,
}

impl ChatService {
    pub fn new(api: ChatApi, dao: ChatCacheDao, current_user: CurrentUser) -> Self {
        Self {
            api,
            dao,
            current_user,
        }
    }

    /// 我参与的全部会话；未登录时返回空列表
    pub async fn list_my_chats(&self) -> Result<Vec<Chat>> {
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[ChatService] 无已登录档案，跳过会话列表拉取");
            return Ok(Vec::new());
        };
        self.api.list_my_chats(&user_id).await
    }

    /// 发起与某位领袖的聊天，返回会话 ID 与其来源
    ///
    /// 查找表命中时不发任何远端请求；未命中则远端查重，
    /// 再未命中才新建。每一步结果都写回查找表。
    pub async fn start_chat(&self, leader_id: &str) -> Result<StartedChat> {
        let Some(worshiper_id) = self.current_user.resolve().await else {
            return Err(anyhow!("无已登录档案，无法发起聊天"));
        };

        if let Some(chat_id) = self.dao.get_chat_id(&worshiper_id, leader_id).await {
            info!(
                "[ChatService] ✅ 查找表命中，会话: {}, 领袖: {}",
                chat_id, leader_id
            );
            return Ok(StartedChat {
                chat_id,
                source: ChatSource::Cached,
            });
        }

        if let Some(chat) = self.api.find_chat_between(&worshiper_id, leader_id).await? {
            self.save_lookup(&worshiper_id, leader_id, &chat.id).await;
            info!(
                "[ChatService] ✅ 远端查重命中，会话: {}, 领袖: {}",
                chat.id, leader_id
            );
            return Ok(StartedChat {
                chat_id: chat.id,
                source: ChatSource::Found,
            });
        }

        let chat = self.api.create_chat(&worshiper_id, leader_id).await?;
        self.save_lookup(&worshiper_id, leader_id, &chat.id).await;
        info!(
            "[ChatService] ✅ 新建会话: {}, 领袖: {}",
            chat.id, leader_id
        );
        Ok(StartedChat {
            chat_id: chat.id,
            source: ChatSource::Created,
        })
    }

    /// 清空本地查找表（登出时调用）
    pub async fn clear_local_cache(&self) {
        if let Err(err) = self.dao.clear().await {
            warn!("[ChatService] 清空会话查找表失败（忽略）: {:?}", err);
        }
    }

    async fn save_lookup(&self, worshiper_id: &str, leader_id: &str, chat_id: &str) {
        if let Err(err) = self.dao.save_chat_id(worshiper_id, leader_id, chat_id).await {
            warn!(
                "[ChatService] 查找表写回失败（忽略），会话: {}, 错误: {:?}",
                chat_id, err
            );
        }
    }
}
