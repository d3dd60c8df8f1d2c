//! C ABI for embedding the serializers in other languages.
//!
//! Every function takes JSON as a null-terminated UTF-8 string and returns a
//! [`FolioResult`] that must be released with [`folio_free_result`].

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::render::{self, JsonFormat, RenderOptions};
use crate::{parse_node_str, parse_str_with_options, ParseOptions};

/// Outcome of an FFI call: either `data` or `error` is set.
#[repr(C)]
pub struct FolioResult {
    /// Whether `data` holds output
    pub success: bool,
    /// The result data (null if failed).
    pub data: *mut c_char,
    /// Error message (null if succeeded).
    pub error: *mut c_char,
}

impl FolioResult {
    fn success(data: String) -> Self {
        match CString::new(data) {
            Ok(data) => Self {
                success: true,
                data: data.into_raw(),
                error: ptr::null_mut(),
            },
            Err(e) => Self::error(format!(
                "Output contains a NUL byte at position {}",
                e.nul_position()
            )),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: ptr::null_mut(),
            error: CString::new(message.into()).unwrap_or_default().into_raw(),
        }
    }

    fn from_result(result: crate::Result<String>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

unsafe fn input<'a>(json: *const c_char) -> Result<&'a str, FolioResult> {
    if json.is_null() {
        return Err(FolioResult::error("Input cannot be null"));
    }
    CStr::from_ptr(json)
        .to_str()
        .map_err(|_| FolioResult::error("Invalid UTF-8 input"))
}

fn options(strict: bool) -> ParseOptions {
    if strict {
        ParseOptions::new().strict()
    } else {
        ParseOptions::new()
    }
}

/// Serialize a node tree to HTML.
///
/// # Safety
///
/// `json` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `folio_free_result`.
#[no_mangle]
pub unsafe extern "C" fn folio_to_html(json: *const c_char) -> FolioResult {
    match input(json) {
        Ok(json) => FolioResult::from_result(
            parse_node_str(json, &ParseOptions::default()).map(|node| render::to_html(&node)),
        ),
        Err(result) => result,
    }
}

/// Serialize a node tree to plain text.
///
/// # Safety
///
/// `json` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `folio_free_result`.
#[no_mangle]
pub unsafe extern "C" fn folio_to_text(json: *const c_char) -> FolioResult {
    match input(json) {
        Ok(json) => FolioResult::from_result(
            parse_node_str(json, &ParseOptions::default()).map(|node| render::to_text(&node)),
        ),
        Err(result) => result,
    }
}

/// Render every page of a document to HTML.
///
/// # Safety
///
/// `json` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `folio_free_result`.
#[no_mangle]
pub unsafe extern "C" fn folio_document_to_html(
    json: *const c_char,
    standalone: bool,
    strict: bool,
) -> FolioResult {
    let json = match input(json) {
        Ok(json) => json,
        Err(result) => return result,
    };
    let render_options = RenderOptions::new().with_standalone(standalone);
    FolioResult::from_result(
        parse_str_with_options(json, &options(strict))
            .map(|doc| render::document_to_html(&doc, &render_options)),
    )
}

/// Render every page of a document to plain text.
///
/// # Safety
///
/// `json` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `folio_free_result`.
#[no_mangle]
pub unsafe extern "C" fn folio_document_to_text(
    json: *const c_char,
    page_headers: bool,
    strict: bool,
) -> FolioResult {
    let json = match input(json) {
        Ok(json) => json,
        Err(result) => return result,
    };
    let render_options = RenderOptions::new().with_page_headers(page_headers);
    FolioResult::from_result(
        parse_str_with_options(json, &options(strict))
            .map(|doc| render::document_to_text(&doc, &render_options)),
    )
}

/// Normalize a document to canonical JSON.
///
/// # Safety
///
/// `json` must be a valid null-terminated UTF-8 string.
/// The returned result must be freed with `folio_free_result`.
#[no_mangle]
pub unsafe extern "C" fn folio_normalize(json: *const c_char, pretty: bool) -> FolioResult {
    let json = match input(json) {
        Ok(json) => json,
        Err(result) => return result,
    };
    let format = if pretty {
        JsonFormat::Pretty
    } else {
        JsonFormat::Compact
    };
    FolioResult::from_result(
        parse_str_with_options(json, &ParseOptions::default())
            .and_then(|doc| render::to_json(&doc, format)),
    )
}

/// Get the logical page count of a document. Returns -1 on error.
///
/// # Safety
///
/// `json` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn folio_get_page_count(json: *const c_char) -> i32 {
    let Ok(json) = input(json) else {
        return -1;
    };
    match parse_str_with_options(json, &ParseOptions::default()) {
        Ok(doc) => doc.page_count() as i32,
        Err(_) => -1,
    }
}

/// Free a result returned by any folio function.
///
/// # Safety
///
/// The `result` must have been returned by a folio function.
/// Call at most once per result.
#[no_mangle]
pub unsafe extern "C" fn folio_free_result(result: FolioResult) {
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
    if !result.error.is_null() {
        drop(CString::from_raw(result.error));
    }
}

/// Get the version of the folio library.
///
/// The string is static; do not free it.
#[no_mangle]
pub extern "C" fn folio_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
