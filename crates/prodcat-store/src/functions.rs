//! SQL functions registered on every pooled connection.
//!
//! SQLite's built-in `upper()` only folds ASCII letters, so descriptions
//! such as `FEIJÃO` or `AÇÚCAR` would never match a lowercase search.
//! [`register_unicode_upper`] replaces it with one that applies full
//! Unicode case mapping.

use std::os::raw::c_int;
use std::ptr;

use libsqlite3_sys::{
    sqlite3_context, sqlite3_create_function_v2, sqlite3_result_error_toobig,
    sqlite3_result_null, sqlite3_result_text, sqlite3_value, sqlite3_value_bytes,
    sqlite3_value_text, sqlite3_value_type, SQLITE_DETERMINISTIC, SQLITE_NULL, SQLITE_OK,
    SQLITE_TRANSIENT, SQLITE_UTF8,
};
use sqlx::SqliteConnection;

const UPPER: &[u8] = b"upper\0";

/// Overrides the one-argument `upper()` on `connection`.
pub(crate) async fn register_unicode_upper(
    connection: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let mut handle = connection.lock_handle().await?;
    let db = handle.as_raw_handle().as_ptr();

    // SAFETY: `db` is a live handle owned by the locked connection, and the
    // function name is a NUL-terminated static.
    let rc = unsafe {
        sqlite3_create_function_v2(
            db,
            UPPER.as_ptr().cast(),
            1,
            SQLITE_UTF8 | SQLITE_DETERMINISTIC,
            ptr::null_mut(),
            Some(unicode_upper),
            None,
            None,
            None,
        )
    };

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(sqlx::Error::Configuration(
            format!("failed to register upper(): sqlite error code {rc}").into(),
        ))
    }
}

unsafe extern "C" fn unicode_upper(
    ctx: *mut sqlite3_context,
    argc: c_int,
    argv: *mut *mut sqlite3_value,
) {
    if argc != 1 || argv.is_null() {
        sqlite3_result_null(ctx);
        return;
    }

    let value = *argv;
    if sqlite3_value_type(value) == SQLITE_NULL {
        sqlite3_result_null(ctx);
        return;
    }

    // `sqlite3_value_text` must run before `sqlite3_value_bytes`.
    let text = sqlite3_value_text(value);
    let len = sqlite3_value_bytes(value);
    let Ok(len) = usize::try_from(len) else {
        sqlite3_result_null(ctx);
        return;
    };
    if text.is_null() {
        sqlite3_result_null(ctx);
        return;
    }

    let bytes = std::slice::from_raw_parts(text, len);
    let upper = fold_upper(bytes);
    match c_int::try_from(upper.len()) {
        Ok(n) => sqlite3_result_text(ctx, upper.as_ptr().cast(), n, SQLITE_TRANSIENT()),
        Err(_) => sqlite3_result_error_toobig(ctx),
    }
}

fn fold_upper(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_uppercase()
}
