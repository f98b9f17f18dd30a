//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps to HTTP status codes and to the
//! failure taxonomy returned by every state-changing operation.

use serde::Serialize;

/// エラー種別の列挙体
///
/// HTTP ステータスコードと、業務操作が返す失敗分類（NotFound / Authorization /
/// Validation / Conflict / RateLimited）の両方に対応します。
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::UnprocessableEntity;
/// assert_eq!(kind.status_code(), 422);
/// assert_eq!(kind.code(), "VALIDATION");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - リクエストの形式が不正
    BadRequest,
    /// 401 - 認証が必要
    Unauthorized,
    /// 403 - 所有権・ロール・権限が不足
    Forbidden,
    /// 404 - 参照先が存在しない
    NotFound,
    /// 409 - 一意制約や現在の状態と競合
    Conflict,
    /// 422 - 形式は正しいが業務上無効（日付順序、状態遷移違反など）
    UnprocessableEntity,
    /// 429 - リクエスト上限を超過
    TooManyRequests,
    /// 500 - サーバー内部エラー
    InternalServerError,
    /// 503 - 依存サービス（DB / KV ストア）が利用不可
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP ステータスコードを取得
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::UnprocessableEntity => 422,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// HTTP ステータスの理由フレーズ
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnprocessableEntity => "Unprocessable Entity",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 機械可読な失敗分類コード
    ///
    /// クライアントが「永久に不可（AUTHORIZATION）」と「今は不可（VALIDATION）」を
    /// 区別できるよう、レスポンスボディの `code` に入ります。
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "AUTHORIZATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::UnprocessableEntity => "VALIDATION",
            ErrorKind::TooManyRequests => "RATE_LIMITED",
            ErrorKind::InternalServerError => "INTERNAL",
            ErrorKind::ServiceUnavailable => "UNAVAILABLE",
        }
    }

    /// 5xx 系（ログに記録すべき）エラーか
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// 4xx 系エラーか
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
