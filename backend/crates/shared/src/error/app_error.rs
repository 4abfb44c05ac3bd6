//! Application Error - Unified error type for the form endpoints
//!
//! Defines the [`AppError`] struct and [`FieldIssue`].

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use serde::Serialize;

use super::kind::ErrorKind;

/// 個々の入力フィールドに対するエラー
///
/// バリデーションで拒否されたフィールド名と、ユーザー向けメッセージの組です。
/// レスポンスの `errors` 配列としてそのままシリアライズされます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: Cow<'static, str>,
    pub message: Cow<'static, str>,
}

impl FieldIssue {
    pub fn new(field: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// アプリケーション統一エラー型
///
/// すべてのエンドポイントが使用する標準エラー型です。
/// ビルダーパターンを使用してエラーを構築できます。
///
/// ## Fields
/// * `kind` - エラーの分類（HTTP ステータスコードにマッピング）
/// * `message` - ユーザー向けのエラーメッセージ（ドイツ語）
/// * `retry_after` - レート制限時の再試行までの秒数（オプション）
/// * `field_errors` - 拒否されたフィールドの一覧
/// * `source` - 元のエラー（オプション、サーバーログ用）
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::TooManyRequests, "Zu viele Anfragen.").with_retry_after(120);
/// assert_eq!(err.status_code(), 429);
/// assert_eq!(err.retry_after(), Some(120));
/// ```
pub struct AppError {
    /// エラー種別
    kind: ErrorKind,
    /// ユーザー向けメッセージ
    message: Cow<'static, str>,
    /// 再試行までの秒数
    retry_after: Option<u64>,
    /// フィールド単位のエラー
    field_errors: Vec<FieldIssue>,
    /// 元のエラー（デバッグ用）
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl AppError {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// 新しいエラーを作成
    ///
    /// ## Arguments
    /// * `kind` - エラー種別
    /// * `message` - ユーザー向けメッセージ
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
            field_errors: Vec::new(),
            source: None,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// 再試行までの秒数を設定
    ///
    /// レスポンスでは `retry_after` フィールドと `Retry-After` ヘッダーになります。
    #[inline]
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// フィールド単位のエラーを設定
    #[inline]
    pub fn with_field_errors(mut self, issues: Vec<FieldIssue>) -> Self {
        self.field_errors = issues;
        self
    }

    /// 元のエラーを設定（デバッグ用）
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::{app_error::AppError, kind::ErrorKind};
    ///
    /// fn read_secret() -> Result<String, AppError> {
    ///     std::fs::read_to_string("secret.txt").map_err(|e| {
    ///         AppError::new(ErrorKind::InternalServerError, "Server-Konfigurationsfehler.")
    ///             .with_source(e)
    ///     })
    /// }
    /// ```
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// エラー種別を取得
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP ステータスコードを取得
    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// メッセージを取得
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 再試行までの秒数を取得
    #[inline]
    pub fn retry_after(&self) -> Option<u64> {
        self.retry_after
    }

    /// フィールド単位のエラーを取得
    #[inline]
    pub fn field_errors(&self) -> &[FieldIssue] {
        &self.field_errors
    }

    /// レスポンスボディ（`{success: false, message, ...}`）を構築
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "success": false,
            "message": self.message(),
        });
        if let Some(seconds) = self.retry_after {
            body["retry_after"] = serde_json::json!(seconds);
        }
        if !self.field_errors.is_empty() {
            body["errors"] = serde_json::json!(self.field_errors);
        }
        body
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if let Some(seconds) = &self.retry_after {
            builder.field("retry_after", seconds);
        }
        if !self.field_errors.is_empty() {
            builder.field("field_errors", &self.field_errors);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(seconds) = self.retry_after {
            write!(f, " (retry after {}s)", seconds)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}
