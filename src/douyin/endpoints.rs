use crate::sign::SignVariant;

/// Paths that the server rejects without an `a_bogus` parameter.
pub const SIGNED_PATHS: [&str; 3] = [
    "/aweme/v1/web/aweme/detail/",
    "/aweme/v1/web/music/aweme/",
    "/aweme/v1/web/user/follower/list/",
];

const REPLY_MARKER: &str = "/user/follower/list/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AwemeDetail,
    UserPost,
    UserFavorite,
    UserCollection,
    MusicAweme,
    ChallengeAweme,
    MixAweme,
    SearchItem,
    UserFollowing,
    UserFollower,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::AwemeDetail => "/aweme/v1/web/aweme/detail/",
            Self::UserPost => "/aweme/v1/web/aweme/post/",
            Self::UserFavorite => "/aweme/v1/web/aweme/favorite/",
            Self::UserCollection => "/aweme/v1/web/aweme/listcollection/",
            Self::MusicAweme => "/aweme/v1/web/music/aweme/",
            Self::ChallengeAweme => "/aweme/v1/web/challenge/aweme/",
            Self::MixAweme => "/aweme/v1/web/mix/aweme/",
            Self::SearchItem => "/aweme/v1/web/search/item/",
            Self::UserFollowing => "/aweme/v1/web/user/following/list/",
            Self::UserFollower => "/aweme/v1/web/user/follower/list/",
        }
    }
}

/// Substring match, so query-carrying or prefixed paths are recognised too.
pub fn needs_signature(path: &str) -> bool {
    SIGNED_PATHS.iter().any(|signed| path.contains(signed))
}

/// Which signing variant a path takes, or `None` when it goes out unsigned.
pub fn sign_variant(path: &str) -> Option<SignVariant> {
    if !needs_signature(path) {
        return None;
    }
    if path.contains(REPLY_MARKER) {
        Some(SignVariant::Reply)
    } else {
        Some(SignVariant::Detail)
    }
}
