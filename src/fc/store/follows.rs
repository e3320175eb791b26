//! 关注状态仓库：我关注的领袖 / 关注我的敬拜者 + 关注乐观转移
//!
//! 关注成功路径不信任本地补丁：提交时整体替换为权威拉取结果。
//! 回滚按回执还原，包括被删条目的原位置。

use crate::fc::follow::models::Follow;
use crate::fc::ids::temp_id;
use crate::fc::types::Reference;
use std::collections::HashSet;
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// 关注关系的全部内存状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowState {
    /// 我（敬拜者）关注的领袖
    pub my_leaders: Vec<Follow>,
    /// 关注我（领袖）的敬拜者
    pub my_worshipers: Vec<Follow>,
}

/// 关注成员判定：列表里是否已有指向该领袖的关注，返回其下标
///
/// 唯一的成员谓词，应用转移与公开查询共用；空领袖 ID 一律视为未关注。
pub fn follow_index_of(follows: &[Follow], leader_id: &str) -> Option<usize> {
    if leader_id.is_empty() {
        return None;
    }
    follows.iter().position(|f| f.leader.matches(leader_id))
}

/// 关注转移回执
#[derive(Debug, Clone, PartialEq)]
pub enum FollowToggle {
    /// 本次是关注：插入了一条临时 ID 占位记录
    Followed { leader_id: String, temp_id: String },
    /// 本次是取关：移除了原有记录（保留原记录与位置供回滚）
    Unfollowed {
        leader_id: String,
        index: usize,
        follow: Follow,
    },
}

/// 关注状态仓库
pub struct FollowStore {
    state: RwLock<FollowState>,
    /// 有关注转移在途的领袖 ID 集合
    toggling: Mutex<HashSet<String>>,
}

impl Default for FollowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(FollowState::default()),
            toggling: Mutex::new(HashSet::new()),
        }
    }

    /// 当前完整状态的克隆快照
    pub fn snapshot(&self) -> FollowState {
        self.state.read().unwrap().clone()
    }

    /// 我关注的领袖列表克隆
    pub fn my_leaders(&self) -> Vec<Follow> {
        self.state.read().unwrap().my_leaders.clone()
    }

    /// 关注我的敬拜者列表克隆
    pub fn my_worshipers(&self) -> Vec<Follow> {
        self.state.read().unwrap().my_worshipers.clone()
    }

    /// 整体替换"我关注的领袖"（权威拉取结果；关注成功后的提交走这里）
    pub fn set_my_leaders(&self, follows: Vec<Follow>) {
        let mut st = self.state.write().unwrap();
        debug!("[FollowStore] 替换我的领袖列表，共 {} 条", follows.len());
        st.my_leaders = follows;
    }

    /// 整体替换"关注我的敬拜者"
    pub fn set_my_worshipers(&self, follows: Vec<Follow>) {
        let mut st = self.state.write().unwrap();
        debug!("[FollowStore] 替换我的敬拜者列表，共 {} 条", follows.len());
        st.my_worshipers = follows;
    }

    /// 登出时清空全部关注状态与在途标记
    pub fn clear(&self) {
        *self.state.write().unwrap() = FollowState::default();
        self.toggling.lock().unwrap().clear();
    }

    /// 是否已关注该领袖（走共享成员谓词，两种引用形状都能命中）
    pub fn is_followed(&self, leader_id: &str) -> bool {
        let st = self.state.read().unwrap();
        follow_index_of(&st.my_leaders, leader_id).is_some()
    }

    /// 取指向该领袖的关注记录（取关时需要其服务端文档 ID）
    pub fn find_follow(&self, leader_id: &str) -> Option<Follow> {
        let st = self.state.read().unwrap();
        follow_index_of(&st.my_leaders, leader_id).map(|i| st.my_leaders[i].clone())
    }

    // ---- 在途保护 ----

    /// 标记该领袖进入关注转移；已有在途转移时返回 false，调用方应跳过
    pub fn begin_toggle(&self, leader_id: &str) -> bool {
        self.toggling.lock().unwrap().insert(leader_id.to_string())
    }

    /// 关注转移结束（提交或回滚后都要调用）
    pub fn finish_toggle(&self, leader_id: &str) {
        self.toggling.lock().unwrap().remove(leader_id);
    }

    /// 该领袖是否有在途的关注转移
    pub fn is_toggling(&self, leader_id: &str) -> bool {
        self.toggling.lock().unwrap().contains(leader_id)
    }

    // ---- 关注转移 ----

    /// 同步应用关注转移：已关注则移除，未关注则插入临时占位记录
    pub fn apply_toggle(&self, worshiper_id: &str, leader_id: &str) -> FollowToggle {
        let mut st = self.state.write().unwrap();

        match follow_index_of(&st.my_leaders, leader_id) {
            Some(index) => {
                let follow = st.my_leaders.remove(index);
                debug!("[FollowStore] 已应用取关转移，领袖: {}", leader_id);
                FollowToggle::Unfollowed {
                    leader_id: leader_id.to_string(),
                    index,
                    follow,
                }
            }
            None => {
                let id = temp_id(leader_id);
                st.my_leaders.push(Follow {
                    id: id.clone(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                    worshiper: Reference::Id(worshiper_id.to_string()),
                    leader: Reference::Id(leader_id.to_string()),
                });
                debug!("[FollowStore] 已应用关注转移，领袖: {}", leader_id);
                FollowToggle::Followed {
                    leader_id: leader_id.to_string(),
                    temp_id: id,
                }
            }
        }
    }

    /// 回滚关注转移：按回执精确还原，包括被删条目的原位置
    pub fn rollback_toggle(&self, receipt: &FollowToggle) {
        let mut st = self.state.write().unwrap();
        match receipt {
            FollowToggle::Followed { leader_id, temp_id } => {
                if let Some(i) = st.my_leaders.iter().position(|f| &f.id == temp_id) {
                    st.my_leaders.remove(i);
                }
                warn!("[FollowStore] ⚠️ 关注已回滚，领袖: {}", leader_id);
            }
            FollowToggle::Unfollowed {
                leader_id,
                index,
                follow,
            } => {
                let at = (*index).min(st.my_leaders.len());
                st.my_leaders.insert(at, follow.clone());
                warn!("[FollowStore] ⚠️ 取关已回滚，领袖: {}", leader_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::profile::models::UserProfile;

    fn follow(id: &str, worshiper: &str, leader: Reference<UserProfile>) -> Follow {
        Follow {
            id: id.to_string(),
            created_at: "2025-01-01T00:00:00.000+00:00".to_string(),
            worshiper: Reference::Id(worshiper.to_string()),
            leader,
        }
    }

    #[test]
    fn test_is_followed_handles_both_reference_shapes() {
        let store = FollowStore::new();
        store.set_my_leaders(vec![
            // 裸 ID 形状
            follow("f1", "me", Reference::Id("leader-a".to_string())),
            // 嵌套档案形状
            follow(
                "f2",
                "me",
                Reference::Embedded(UserProfile {
                    id: "leader-b".to_string(),
                    name: "Father Thomas".to_string(),
                    ..Default::default()
                }),
            ),
        ]);

        assert!(store.is_followed("leader-a"));
        assert!(store.is_followed("leader-b"));
        assert!(!store.is_followed("leader-c"));
        assert!(!store.is_followed(""));
    }

    #[test]
    fn test_toggle_twice_returns_to_original() {
        let store = FollowStore::new();
        store.set_my_leaders(vec![follow("f1", "me", Reference::Id("l1".to_string()))]);
        let original = store.snapshot();

        let first = store.apply_toggle("me", "l2");
        assert!(matches!(first, FollowToggle::Followed { .. }));
        assert!(store.is_followed("l2"));

        let second = store.apply_toggle("me", "l2");
        assert!(matches!(second, FollowToggle::Unfollowed { .. }));

        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_rollback_restores_follow_at_original_index() {
        let store = FollowStore::new();
        store.set_my_leaders(vec![
            follow("f1", "me", Reference::Id("l1".to_string())),
            follow("f2", "me", Reference::Id("l2".to_string())),
            follow("f3", "me", Reference::Id("l3".to_string())),
        ]);
        let original = store.snapshot();

        // 取关中间一条
        let receipt = store.apply_toggle("me", "l2");
        match &receipt {
            FollowToggle::Unfollowed { index, follow, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(follow.id, "f2");
            }
            _ => panic!("应当是取关方向"),
        }
        assert!(!store.is_followed("l2"));

        store.rollback_toggle(&receipt);
        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_rollback_removes_optimistic_follow() {
        let store = FollowStore::new();
        let original = store.snapshot();

        let receipt = store.apply_toggle("me", "l9");
        assert!(store.is_followed("l9"));
        match &receipt {
            FollowToggle::Followed { temp_id, .. } => {
                assert!(crate::fc::ids::is_temp_id(temp_id));
            }
            _ => panic!("应当是关注方向"),
        }

        store.rollback_toggle(&receipt);
        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_in_flight_guard() {
        let store = FollowStore::new();
        assert!(store.begin_toggle("l1"));
        assert!(!store.begin_toggle("l1"));
        assert!(store.is_toggling("l1"));
        assert!(!store.is_toggling("l2"));

        store.finish_toggle("l1");
        assert!(store.begin_toggle("l1"));
    }

    #[test]
    fn test_set_my_leaders_replaces_optimistic_patch() {
        let store = FollowStore::new();
        store.apply_toggle("me", "l1");
        assert!(crate::fc::ids::is_temp_id(&store.my_leaders()[0].id));

        // 权威拉取结果整体替换，临时记录消失
        store.set_my_leaders(vec![follow("srv1", "me", Reference::Id("l1".to_string()))]);
        let leaders = store.my_leaders();
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].id, "srv1");
        assert!(store.is_followed("l1"));
    }
}
