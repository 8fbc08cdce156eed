//! FFI interface for C/C++ hosts
//!
//! The product goes back as a JSON string so the host never has to mirror
//! the Rust types.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::pipeline::{get_product, ProductScraper};
use crate::product::Product;
use crate::sites::SiteSelectors;
use crate::ProductError;

/// Result struct returned to the host.
/// Exactly one pointer is non-null. Both are owned by Rust and must be
/// released with `free_product_result`.
#[repr(C)]
pub struct ProductResultFFI {
    /// JSON-serialized product (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Extract a product from a page using the built-in site tables.
///
/// # Arguments
/// * `url` - Page URL (null-terminated)
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
///
/// # Safety
/// - `url` must be a valid null-terminated C string
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - Caller must free the result via `free_product_result`
#[no_mangle]
pub unsafe extern "C" fn extract_product(
    url: *const c_char,
    html_ptr: *const c_char,
    html_len: usize,
) -> ProductResultFFI {
    let url = match read_c_str(url, "URL") {
        Ok(u) => u,
        Err(msg) => return make_error_result(&msg),
    };
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(&msg),
    };

    make_product_result(get_product(url, html))
}

/// Like `extract_product`, with extra site tables checked before the
/// built-in ones.
///
/// # Arguments
/// * `sites_json` - JSON array of site tables (null-terminated)
///
/// # Safety
/// Same as `extract_product`; `sites_json` must be a valid null-terminated
/// C string.
#[no_mangle]
pub unsafe extern "C" fn extract_product_with_sites(
    url: *const c_char,
    html_ptr: *const c_char,
    html_len: usize,
    sites_json: *const c_char,
) -> ProductResultFFI {
    let url = match read_c_str(url, "URL") {
        Ok(u) => u,
        Err(msg) => return make_error_result(&msg),
    };
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(&msg),
    };
    let sites_str = match read_c_str(sites_json, "site tables JSON") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let sites: Vec<SiteSelectors> = match serde_json::from_str(sites_str) {
        Ok(s) => s,
        Err(e) => {
            return make_error_result(&format!("Failed to parse site tables JSON: {}", e));
        }
    };

    // Keep the caller's order: the first table in the array is checked first
    let scraper = sites
        .into_iter()
        .rev()
        .fold(ProductScraper::default(), ProductScraper::with_site);

    make_product_result(scraper.scrape(url, html))
}

/// Free a ProductResultFFI returned by one of the extract functions
///
/// # Safety
/// - `result` must have been returned by `extract_product` or
///   `extract_product_with_sites`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_product_result(result: ProductResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

/// Route the crate's log output to stderr, filtered by `RUST_LOG`.
/// Returns false when a logger was already installed.
#[no_mangle]
pub extern "C" fn product_parser_init_logging() -> bool {
    env_logger::try_init().is_ok()
}

unsafe fn read_c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what))
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, String> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content".to_string())
}

fn make_product_result(result: Result<Product, ProductError>) -> ProductResultFFI {
    let product = match result {
        Ok(p) => p,
        Err(e) => return make_error_result(&e.to_string()),
    };

    match serde_json::to_string(&product) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ProductResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize product: {}", e)),
    }
}

fn make_error_result(msg: &str) -> ProductResultFFI {
    let error_cstr = CString::new(msg.replace('\0', "")).unwrap_or_default();
    ProductResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
