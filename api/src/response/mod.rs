use serde::Serialize;

/// Envelope for every JSON body the station returns.
///
/// ```json
/// {
///   "success": true,
///   "data": { "code": "472-910", "expires_at": "..." },
///   "message": "Access code issued"
/// }
/// ```
///
/// Error responses carry `success: false`, the default value of `T` as data
/// and a human-readable message.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error response with `T::default()` as data.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}
