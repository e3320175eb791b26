//! 用户档案服务层
//!
//! 维护当前登录用户句柄和档案快照缓存；远端读不到时回退快照，
//! 让冷启动先展示上一次的已知档案。

use crate::fc::kv::{keys, KvStore};
use crate::fc::profile::api::ProfileApi;
use crate::fc::profile::models::{NewProfile, ProfileUpdate, UserProfile};
use anyhow::Result;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// 当前登录用户句柄
///
/// 客户端登录后写入档案 ID，各服务显式持有它；内存里没有时
/// 回退键值缓存里的档案快照，两者都没有则视为未登录。
#[derive(Clone)]
pub struct CurrentUser {
    profile_id: Arc<RwLock<Option<String>>>,
    kv: KvStore,
}

impl CurrentUser {
    pub fn new(kv: KvStore) -> Self {
        Self {
            profile_id: Arc::new(RwLock::new(None)),
            kv,
        }
    }

    /// 登录、角色设置、登出后由客户端写入
    pub fn set(&self, profile_id: Option<String>) {
        *self.profile_id.write().unwrap() = profile_id;
    }

    /// 内存中的档案 ID（不读缓存）
    pub fn get(&self) -> Option<String> {
        self.profile_id
            .read()
            .unwrap()
            .clone()
            .filter(|id| !id.is_empty())
    }

    /// 解析当前档案 ID：优先内存，其次缓存的档案快照
    pub async fn resolve(&self) -> Option<String> {
        if let Some(id) = self.get() {
            return Some(id);
        }
        let cached: Option<UserProfile> = self.kv.get(keys::USER_PROFILE).await;
        match cached {
            Some(profile) if !profile.id.is_empty() => {
                debug!(
                    "[CurrentUser] 内存中无档案 ID，使用缓存快照: {}",
                    profile.id
                );
                Some(profile.id)
            }
            _ => None,
        }
    }
}

/// 用户档案服务
pub struct ProfileService {
    api: ProfileApi,
    kv: KvStore,
    current_user: CurrentUser,
}

impl ProfileService {
    pub fn new(api: ProfileApi, kv: KvStore, current_user: CurrentUser) -> Self {
        Self {
            api,
            kv,
            current_user,
        }
    }

    /// 角色设置：创建档案并登记为当前用户
    pub async fn setup_profile(&self, user_id: &str, new: NewProfile) -> Result<UserProfile> {
        let profile = self.api.create_profile(user_id, new).await?;
        self.kv.set_best_effort(keys::USER_PROFILE, &profile).await;
        self.current_user.set(Some(profile.id.clone()));
        info!("[ProfileService] ✅ 档案已创建并登记为当前用户: {}", profile.id);
        Ok(profile)
    }

    /// 加载当前用户档案：远端优先，失败时回退缓存快照
    pub async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        match self.api.get_profile(user_id).await {
            Ok(profile) => {
                self.kv.set_best_effort(keys::USER_PROFILE, &profile).await;
                self.current_user.set(Some(profile.id.clone()));
                Ok(profile)
            }
            Err(err) => {
                let cached: Option<UserProfile> = self.kv.get(keys::USER_PROFILE).await;
                match cached {
                    Some(profile) if profile.id == user_id => {
                        warn!(
                            "[ProfileService] ⚠️ 远端档案读取失败，使用缓存快照: {}, 错误: {:?}",
                            user_id, err
                        );
                        self.current_user.set(Some(profile.id.clone()));
                        Ok(profile)
                    }
                    _ => Err(err),
                }
            }
        }
    }

    /// 读取任意用户档案（不更新当前用户登记）
    pub async fn get_profile(&self, profile_id: &str) -> Result<UserProfile> {
        self.api.get_profile(profile_id).await
    }

    /// 更新档案；更新的是当前用户时刷新快照
    pub async fn update_profile(
        &self,
        profile_id: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile> {
        let profile = self.api.update_profile(profile_id, update).await?;
        if self.current_user.get().as_deref() == Some(profile_id) {
            self.kv.set_best_effort(keys::USER_PROFILE, &profile).await;
        }
        Ok(profile)
    }

    /// 列出全部领袖档案
    pub async fn get_all_leaders(&self) -> Result<Vec<UserProfile>> {
        self.api.list_leaders().await
    }
}
