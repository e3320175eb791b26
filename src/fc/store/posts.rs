//! 帖子状态仓库：信息流 + 点赞/评论乐观转移
//!
//! 同一帖子可能同时出现在信息流列表和当前详情里，
//! 转移会统一应用到所有副本；回执（receipt）记录这次转移
//! 具体做了什么，回滚按回执精确还原，包括被删元素的位置。

use crate::fc::comment::models::Comment;
use crate::fc::ids::temp_id;
use crate::fc::like::models::Like;
use crate::fc::post::models::Post;
use crate::fc::types::Reference;
use std::collections::HashSet;
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// 帖子相关的全部内存状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFeedState {
    /// 发现页信息流（图文帖）
    pub explore: Vec<Post>,
    /// 短视频信息流
    pub reels: Vec<Post>,
    /// 当前打开的帖子详情
    pub current: Option<Post>,
}

/// 点赞成员判定：likes[] 里是否已有该用户的点赞，返回其下标
///
/// 这是唯一的成员谓词，应用转移、公开查询都走它，
/// 保证"是否已点赞"的判定不会在两处算出不同结果。
/// 空用户 ID 一律视为未点赞。
pub fn like_index_of(likes: &[Like], user_id: &str) -> Option<usize> {
    if user_id.is_empty() {
        return None;
    }
    likes.iter().position(|l| l.user.matches(user_id))
}

/// 点赞转移回执：记录这次乐观转移做了什么，回滚按它精确还原
#[derive(Debug, Clone, PartialEq)]
pub enum LikeToggle {
    /// 本次是点赞：插入了一条临时 ID 占位记录
    Added {
        post_id: String,
        user_id: String,
        temp_id: String,
    },
    /// 本次是取消点赞：移除了原有记录（保留原记录与位置供回滚）
    Removed {
        post_id: String,
        user_id: String,
        index: usize,
        like: Like,
    },
}

/// 评论追加回执
#[derive(Debug, Clone, PartialEq)]
pub struct CommentAppend {
    pub post_id: String,
    pub temp_id: String,
}

/// 帖子状态仓库
pub struct PostStore {
    state: RwLock<PostFeedState>,
    /// 有点赞转移在途的帖子 ID 集合（按键串行化，快速连点只生效一次）
    like_toggling: Mutex<HashSet<String>>,
}

impl Default for PostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PostFeedState::default()),
            like_toggling: Mutex::new(HashSet::new()),
        }
    }

    // ---- 列表快照与替换 ----

    /// 当前完整状态的克隆快照
    pub fn snapshot(&self) -> PostFeedState {
        self.state.read().unwrap().clone()
    }

    /// 整体替换发现页信息流（权威拉取结果）
    pub fn set_explore(&self, posts: Vec<Post>) {
        let mut st = self.state.write().unwrap();
        debug!("[PostStore] 替换发现页信息流，共 {} 条", posts.len());
        st.explore = posts;
    }

    /// 整体替换短视频信息流
    pub fn set_reels(&self, posts: Vec<Post>) {
        let mut st = self.state.write().unwrap();
        debug!("[PostStore] 替换短视频信息流，共 {} 条", posts.len());
        st.reels = posts;
    }

    /// 设置当前打开的帖子详情
    pub fn set_current(&self, post: Option<Post>) {
        let mut st = self.state.write().unwrap();
        st.current = post;
    }

    /// 登出时清空全部信息流状态与在途标记
    pub fn clear(&self) {
        *self.state.write().unwrap() = PostFeedState::default();
        self.like_toggling.lock().unwrap().clear();
    }

    /// 在所有副本中查找帖子（发现页、短视频、当前详情）
    pub fn find_post(&self, post_id: &str) -> Option<Post> {
        let st = self.state.read().unwrap();
        find_in_state(&st, post_id).cloned()
    }

    /// 当前用户是否已点赞该帖（走共享成员谓词）
    pub fn is_liked(&self, post_id: &str, user_id: &str) -> bool {
        let st = self.state.read().unwrap();
        find_in_state(&st, post_id)
            .map(|p| like_index_of(&p.likes, user_id).is_some())
            .unwrap_or(false)
    }

    // ---- 在途保护 ----

    /// 标记该帖进入点赞转移；已有在途转移时返回 false，调用方应跳过
    pub fn begin_like_toggle(&self, post_id: &str) -> bool {
        self.like_toggling.lock().unwrap().insert(post_id.to_string())
    }

    /// 点赞转移结束（提交或回滚后都要调用）
    pub fn finish_like_toggle(&self, post_id: &str) {
        self.like_toggling.lock().unwrap().remove(post_id);
    }

    /// 该帖是否有在途的点赞转移
    pub fn is_like_toggling(&self, post_id: &str) -> bool {
        self.like_toggling.lock().unwrap().contains(post_id)
    }

    // ---- 点赞转移 ----

    /// 同步应用点赞转移：已点赞则移除并减计数，未点赞则插入临时占位并加计数
    ///
    /// 帖子不在任何列表里时返回 None（调用方按前置条件缺失跳过）。
    pub fn apply_like_toggle(&self, post_id: &str, user_id: &str) -> Option<LikeToggle> {
        let mut st = self.state.write().unwrap();

        // 先在任一副本上用共享谓词判定方向，再统一应用到所有副本
        let receipt = {
            let probe = find_in_state(&st, post_id)?;
            match like_index_of(&probe.likes, user_id) {
                Some(index) => LikeToggle::Removed {
                    post_id: post_id.to_string(),
                    user_id: user_id.to_string(),
                    index,
                    like: probe.likes[index].clone(),
                },
                None => LikeToggle::Added {
                    post_id: post_id.to_string(),
                    user_id: user_id.to_string(),
                    temp_id: temp_id(user_id),
                },
            }
        };

        for_each_copy(&mut st, post_id, |post| match &receipt {
            LikeToggle::Added { temp_id, .. } => {
                post.likes.push(Like {
                    id: temp_id.clone(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                    user: Reference::Id(user_id.to_string()),
                    post: Reference::Id(post_id.to_string()),
                });
                post.likes_count += 1;
            }
            LikeToggle::Removed { .. } => {
                if let Some(i) = like_index_of(&post.likes, user_id) {
                    post.likes.remove(i);
                    post.likes_count = post.likes_count.saturating_sub(1);
                }
            }
        });

        debug!(
            "[PostStore] 已应用点赞转移，帖子: {}, 方向: {}",
            post_id,
            match &receipt {
                LikeToggle::Added { .. } => "点赞",
                LikeToggle::Removed { .. } => "取消点赞",
            }
        );
        Some(receipt)
    }

    /// 提交点赞转移：临时占位记录换成服务端返回的正式记录
    pub fn commit_like(&self, receipt: &LikeToggle, server_like: &Like) {
        match receipt {
            LikeToggle::Added { post_id, temp_id, .. } => {
                let mut st = self.state.write().unwrap();
                for_each_copy(&mut st, post_id, |post| {
                    if let Some(i) = post.likes.iter().position(|l| &l.id == temp_id) {
                        post.likes[i] = server_like.clone();
                    }
                });
                debug!(
                    "[PostStore] 点赞已提交，帖子: {}, 服务端ID: {}",
                    post_id, server_like.id
                );
            }
            LikeToggle::Removed { post_id, .. } => {
                // 删除方向提交无需改状态，远端删除已确认
                debug!("[PostStore] 取消点赞已提交，帖子: {}", post_id);
            }
        }
    }

    /// 回滚点赞转移：按回执精确还原，包括被删元素的原位置
    pub fn rollback_like_toggle(&self, receipt: &LikeToggle) {
        let mut st = self.state.write().unwrap();
        match receipt {
            LikeToggle::Added { post_id, temp_id, .. } => {
                for_each_copy(&mut st, post_id, |post| {
                    if let Some(i) = post.likes.iter().position(|l| &l.id == temp_id) {
                        post.likes.remove(i);
                        post.likes_count = post.likes_count.saturating_sub(1);
                    }
                });
                warn!("[PostStore] ⚠️ 点赞已回滚，帖子: {}", post_id);
            }
            LikeToggle::Removed {
                post_id,
                index,
                like,
                ..
            } => {
                for_each_copy(&mut st, post_id, |post| {
                    let at = (*index).min(post.likes.len());
                    post.likes.insert(at, like.clone());
                    post.likes_count += 1;
                });
                warn!("[PostStore] ⚠️ 取消点赞已回滚，帖子: {}", post_id);
            }
        }
    }

    // ---- 评论转移 ----

    /// 同步追加评论占位记录并加计数；帖子不在列表里时返回 None
    pub fn apply_comment(&self, post_id: &str, comment: Comment) -> Option<CommentAppend> {
        let mut st = self.state.write().unwrap();
        find_in_state(&st, post_id)?;

        let receipt = CommentAppend {
            post_id: post_id.to_string(),
            temp_id: comment.id.clone(),
        };
        for_each_copy(&mut st, post_id, |post| {
            post.comments.push(comment.clone());
            post.comments_count += 1;
        });
        debug!(
            "[PostStore] 已追加评论占位，帖子: {}, 临时ID: {}",
            post_id, receipt.temp_id
        );
        Some(receipt)
    }

    /// 提交评论：临时占位换成服务端返回的正式记录
    pub fn commit_comment(&self, receipt: &CommentAppend, server_comment: &Comment) {
        let mut st = self.state.write().unwrap();
        for_each_copy(&mut st, &receipt.post_id, |post| {
            if let Some(i) = post
                .comments
                .iter()
                .position(|c| c.id == receipt.temp_id)
            {
                post.comments[i] = server_comment.clone();
            }
        });
        debug!(
            "[PostStore] 评论已提交，帖子: {}, 服务端ID: {}",
            receipt.post_id, server_comment.id
        );
    }

    /// 回滚评论追加：移除占位记录并减计数
    pub fn rollback_comment(&self, receipt: &CommentAppend) {
        let mut st = self.state.write().unwrap();
        for_each_copy(&mut st, &receipt.post_id, |post| {
            if let Some(i) = post
                .comments
                .iter()
                .position(|c| c.id == receipt.temp_id)
            {
                post.comments.remove(i);
                post.comments_count = post.comments_count.saturating_sub(1);
            }
        });
        warn!("[PostStore] ⚠️ 评论已回滚，帖子: {}", receipt.post_id);
    }
}

/// 在状态的所有列表里查找帖子
fn find_in_state<'a>(st: &'a PostFeedState, post_id: &str) -> Option<&'a Post> {
    st.explore
        .iter()
        .find(|p| p.id == post_id)
        .or_else(|| st.reels.iter().find(|p| p.id == post_id))
        .or_else(|| st.current.as_ref().filter(|p| p.id == post_id))
}

/// 对帖子的每个副本（发现页、短视频、当前详情）应用同一修改
fn for_each_copy(st: &mut PostFeedState, post_id: &str, mut f: impl FnMut(&mut Post)) {
    if let Some(p) = st.explore.iter_mut().find(|p| p.id == post_id) {
        f(p);
    }
    if let Some(p) = st.reels.iter_mut().find(|p| p.id == post_id) {
        f(p);
    }
    if let Some(p) = st.current.as_mut().filter(|p| p.id == post_id) {
        f(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::profile::models::UserProfile;

    fn server_like(id: &str, user_id: &str, post_id: &str) -> Like {
        Like {
            id: id.to_string(),
            created_at: "2025-01-01T00:00:00.000+00:00".to_string(),
            user: Reference::Id(user_id.to_string()),
            post: Reference::Id(post_id.to_string()),
        }
    }

    fn post_with_likes(post_id: &str, likes: Vec<Like>) -> Post {
        let count = likes.len() as i64;
        Post {
            id: post_id.to_string(),
            created_at: "2025-01-01T00:00:00.000+00:00".to_string(),
            leader: Reference::Id("leader1".to_string()),
            kind: Default::default(),
            text: Some("daily word".to_string()),
            media_url: None,
            likes_count: count,
            comments_count: 0,
            likes,
            comments: Vec::new(),
        }
    }

    fn store_with(posts: Vec<Post>) -> PostStore {
        let store = PostStore::new();
        store.set_explore(posts);
        store
    }

    #[test]
    fn test_toggle_twice_returns_to_original() {
        let store = store_with(vec![post_with_likes(
            "p1",
            vec![server_like("l1", "u2", "p1")],
        )]);
        let original = store.snapshot();

        // 第一次：u1 点赞（插入占位）
        let first = store.apply_like_toggle("p1", "u1").unwrap();
        assert!(matches!(first, LikeToggle::Added { .. }));
        assert!(store.is_liked("p1", "u1"));
        assert_eq!(store.find_post("p1").unwrap().likes_count, 2);

        // 第二次：同一谓词判定为已点赞，移除占位
        let second = store.apply_like_toggle("p1", "u1").unwrap();
        assert!(matches!(second, LikeToggle::Removed { .. }));

        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_rollback_restores_added_like_exactly() {
        let store = store_with(vec![post_with_likes(
            "p1",
            vec![server_like("l1", "u2", "p1")],
        )]);
        let original = store.snapshot();

        let receipt = store.apply_like_toggle("p1", "u1").unwrap();
        assert_ne!(store.snapshot(), original);

        store.rollback_like_toggle(&receipt);
        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_rollback_restores_removed_like_at_original_index() {
        // u2 的点赞在中间位置，回滚必须还原到同一位置
        let store = store_with(vec![post_with_likes(
            "p1",
            vec![
                server_like("l1", "u1", "p1"),
                server_like("l2", "u2", "p1"),
                server_like("l3", "u3", "p1"),
            ],
        )]);
        let original = store.snapshot();

        let receipt = store.apply_like_toggle("p1", "u2").unwrap();
        match &receipt {
            LikeToggle::Removed { index, like, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(like.id, "l2");
            }
            _ => panic!("应当是移除方向"),
        }
        assert_eq!(store.find_post("p1").unwrap().likes_count, 2);

        store.rollback_like_toggle(&receipt);
        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_commit_replaces_temp_id_with_server_id() {
        let store = store_with(vec![post_with_likes("p1", vec![])]);

        let receipt = store.apply_like_toggle("p1", "u1").unwrap();
        let temp = match &receipt {
            LikeToggle::Added { temp_id, .. } => temp_id.clone(),
            _ => panic!("应当是点赞方向"),
        };
        assert!(crate::fc::ids::is_temp_id(&temp));

        store.commit_like(&receipt, &server_like("srv9", "u1", "p1"));

        let post = store.find_post("p1").unwrap();
        assert_eq!(post.likes.len(), 1);
        assert_eq!(post.likes[0].id, "srv9");
        assert_eq!(post.likes_count, 1);
        assert!(store.is_liked("p1", "u1"));
    }

    #[test]
    fn test_toggle_applies_to_every_copy() {
        let post = post_with_likes("p1", vec![]);
        let store = PostStore::new();
        store.set_explore(vec![post.clone()]);
        store.set_current(Some(post));

        let receipt = store.apply_like_toggle("p1", "u1").unwrap();

        let st = store.snapshot();
        assert_eq!(st.explore[0].likes_count, 1);
        assert_eq!(st.current.as_ref().unwrap().likes_count, 1);

        store.rollback_like_toggle(&receipt);
        let st = store.snapshot();
        assert_eq!(st.explore[0].likes_count, 0);
        assert_eq!(st.current.as_ref().unwrap().likes_count, 0);
    }

    #[test]
    fn test_unknown_post_is_noop() {
        let store = store_with(vec![post_with_likes("p1", vec![])]);
        assert!(store.apply_like_toggle("nope", "u1").is_none());
        assert!(!store.is_liked("nope", "u1"));
    }

    #[test]
    fn test_empty_user_id_never_liked() {
        let likes = vec![server_like("l1", "u1", "p1")];
        assert_eq!(like_index_of(&likes, ""), None);
        assert_eq!(like_index_of(&likes, "u1"), Some(0));

        // 嵌套档案形状同样命中
        let embedded = vec![Like {
            user: Reference::Embedded(UserProfile {
                id: "u5".to_string(),
                ..Default::default()
            }),
            ..server_like("l2", "ignored", "p1")
        }];
        assert_eq!(like_index_of(&embedded, "u5"), Some(0));
    }

    #[test]
    fn test_in_flight_guard_blocks_second_toggle() {
        let store = PostStore::new();
        assert!(store.begin_like_toggle("p1"));
        assert!(!store.begin_like_toggle("p1"));
        assert!(store.is_like_toggling("p1"));

        // 不同帖子互不影响
        assert!(store.begin_like_toggle("p2"));

        store.finish_like_toggle("p1");
        assert!(store.begin_like_toggle("p1"));
    }

    #[test]
    fn test_comment_append_commit_and_rollback() {
        let store = store_with(vec![post_with_likes("p1", vec![])]);
        let original = store.snapshot();

        let placeholder = Comment {
            id: "temp-u1-123".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            post: Reference::Id("p1".to_string()),
            author: Reference::Id("u1".to_string()),
            text: "Amen".to_string(),
        };
        let receipt = store.apply_comment("p1", placeholder.clone()).unwrap();
        assert_eq!(store.find_post("p1").unwrap().comments_count, 1);

        // 回滚路径
        store.rollback_comment(&receipt);
        assert_eq!(store.snapshot(), original);

        // 提交路径
        let receipt = store.apply_comment("p1", placeholder).unwrap();
        let server = Comment {
            id: "c-srv".to_string(),
            created_at: "2025-01-01T00:00:00.000+00:00".to_string(),
            post: Reference::Id("p1".to_string()),
            author: Reference::Id("u1".to_string()),
            text: "Amen".to_string(),
        };
        store.commit_comment(&receipt, &server);

        let post = store.find_post("p1").unwrap();
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].id, "c-srv");
        assert_eq!(post.comments_count, 1);
    }
}
