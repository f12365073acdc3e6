//! Curated names that are never treated as handler dependencies.
//!
//! The set is a closed configuration: language primordials, the web platform
//! surface handlers commonly touch, timers, `console`, `crypto`, `Intl`, and
//! `arguments`. Callers may override it wholesale through the plugin options.

pub const DEFAULT_GLOBALS: &[&str] = &[
    // Language primordials
    "Array",
    "ArrayBuffer",
    "BigInt",
    "BigInt64Array",
    "BigUint64Array",
    "Boolean",
    "DataView",
    "Date",
    "Error",
    "EvalError",
    "FinalizationRegistry",
    "Float32Array",
    "Float64Array",
    "Function",
    "Infinity",
    "Int16Array",
    "Int32Array",
    "Int8Array",
    "JSON",
    "Map",
    "Math",
    "NaN",
    "Number",
    "Object",
    "Promise",
    "Proxy",
    "RangeError",
    "ReferenceError",
    "Reflect",
    "RegExp",
    "Set",
    "SharedArrayBuffer",
    "String",
    "Symbol",
    "SyntaxError",
    "TypeError",
    "URIError",
    "Uint16Array",
    "Uint32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "WeakMap",
    "WeakRef",
    "WeakSet",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "eval",
    "globalThis",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "undefined",
    // Web platform
    "AbortController",
    "AbortSignal",
    "Blob",
    "BroadcastChannel",
    "CustomEvent",
    "DOMParser",
    "Element",
    "Event",
    "EventTarget",
    "File",
    "FileReader",
    "FormData",
    "HTMLElement",
    "HTMLInputElement",
    "Headers",
    "Image",
    "IntersectionObserver",
    "KeyboardEvent",
    "MessageChannel",
    "MouseEvent",
    "MutationObserver",
    "Node",
    "Notification",
    "PointerEvent",
    "Request",
    "ResizeObserver",
    "Response",
    "TextDecoder",
    "TextEncoder",
    "TouchEvent",
    "URL",
    "URLSearchParams",
    "WebSocket",
    "Worker",
    "XMLHttpRequest",
    "alert",
    "atob",
    "btoa",
    "confirm",
    "devicePixelRatio",
    "document",
    "fetch",
    "history",
    "localStorage",
    "location",
    "matchMedia",
    "navigator",
    "performance",
    "prompt",
    "self",
    "sessionStorage",
    "structuredClone",
    "window",
    // Timers and scheduling
    "cancelAnimationFrame",
    "cancelIdleCallback",
    "clearInterval",
    "clearTimeout",
    "queueMicrotask",
    "requestAnimationFrame",
    "requestIdleCallback",
    "setInterval",
    "setTimeout",
    // Misc runtime
    "Intl",
    "arguments",
    "console",
    "crypto",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn no_duplicate_globals() {
        let mut seen = HashSet::new();
        for name in DEFAULT_GLOBALS {
            assert!(seen.insert(name), "duplicate global: {name}");
        }
    }

    #[test]
    fn covers_the_names_handlers_lean_on() {
        for name in ["URL", "fetch", "console", "setTimeout", "arguments"] {
            assert!(DEFAULT_GLOBALS.contains(&name));
        }
    }
}
