//! Page-side scripts
//!
//! Found nodes live in a registry on `window` and are addressed by a
//! string key. A navigation wipes the registry, and a removed node reports
//! `isConnected == false`; either way the element scripts throw a
//! `stale element reference` error. Detached entries are dropped from the
//! registry when touched and swept on every lookup.

use crate::locator::{Locator, Strategy};

/// Prefix of the error thrown for a detached node
pub const STALE_MARKER: &str = "stale element reference";

const REGISTRY: &str = "window.__harnessRefs";

/// Quote a string as a JavaScript literal
pub fn literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Expression yielding an array of all nodes matching the locator
fn query(locator: &Locator) -> String {
    let v = literal(locator.value());
    match locator.strategy() {
        Strategy::Id => format!("(() => {{ const n = document.getElementById({}); return n ? [n] : []; }})()", v),
        Strategy::Name => format!("Array.from(document.getElementsByName({}))", v),
        Strategy::ClassName => format!("Array.from(document.getElementsByClassName({}))", v),
        Strategy::TagName => format!("Array.from(document.getElementsByTagName({}))", v),
        Strategy::Css => format!("Array.from(document.querySelectorAll({}))", v),
        Strategy::XPath => format!(
            "(() => {{ const r = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()",
            v
        ),
        Strategy::LinkText => format!(
            "Array.from(document.querySelectorAll('a')).filter(a => a.textContent.trim() === {})",
            v
        ),
        Strategy::PartialLinkText => format!(
            "Array.from(document.querySelectorAll('a')).filter(a => a.textContent.includes({}))",
            v
        ),
        Strategy::TextContains => format!(
            "Array.from(document.querySelectorAll('body *')).filter(e => \
             Array.from(e.childNodes).some(c => c.nodeType === 3 && c.textContent.includes({})))",
            v
        ),
        // Mobile-only strategies never reach a web page
        other => format!("(() => {{ throw new SyntaxError('unsupported strategy {}'); }})()", other.as_str()),
    }
}

/// Register the first (or every) match and return its key(s)
pub fn find(locator: &Locator, all: bool) -> String {
    let pick = if all { "nodes" } else { "nodes.slice(0, 1)" };
    let ret = if all { "keys" } else { "keys.length ? keys[0] : null" };
    format!(
        "(() => {{ \
         const reg = {REGISTRY} = {REGISTRY} || {{ next: 0, nodes: {{}} }}; \
         for (const k in reg.nodes) {{ if (!reg.nodes[k].isConnected) delete reg.nodes[k]; }} \
         const nodes = {query}; \
         const keys = {pick}.map(n => {{ const k = 'h' + (reg.next++); reg.nodes[k] = n; return k; }}); \
         return {ret}; }})()",
        query = query(locator),
    )
}

/// Run `body` with `el` bound to the registered node. A detached node is
/// unregistered and reported stale.
pub fn on_element(key: &str, body: &str) -> String {
    format!(
        "(() => {{ \
         const reg = {REGISTRY}; \
         const el = reg && reg.nodes[{key}]; \
         if (!el || !el.isConnected) {{ \
         if (el) delete reg.nodes[{key}]; \
         throw new Error('{STALE_MARKER}: ' + {key}); }} \
         {body} }})()",
        key = literal(key),
    )
}

pub const ATTACHED: &str = "return true;";

pub const DISPLAYED: &str = "const s = window.getComputedStyle(el); \
    return s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0' \
    && el.getClientRects().length > 0;";

pub const ENABLED: &str = "return !el.disabled;";

pub const TEXT: &str = "return (el.innerText !== undefined ? el.innerText : el.textContent).trim();";

pub const RECT: &str = "const r = el.getBoundingClientRect(); \
    return { x: r.x, y: r.y, width: r.width, height: r.height };";

pub const SCROLL_INTO_VIEW: &str = "el.scrollIntoView({ block: 'center', inline: 'center' }); return true;";

pub const FOCUS: &str = "el.focus(); return true;";

pub const CLEAR: &str = "el.focus(); \
    if ('value' in el) { el.value = ''; } else if (el.isContentEditable) { el.textContent = ''; } \
    el.dispatchEvent(new Event('input', { bubbles: true })); \
    el.dispatchEvent(new Event('change', { bubbles: true })); return true;";

pub fn attribute(name: &str) -> String {
    format!("return el.getAttribute({});", literal(name))
}

/// Wrap a caller script as a function body applied to JSON arguments
pub fn user_script(script: &str, args: &[serde_json::Value]) -> String {
    let args = serde_json::Value::Array(args.to_vec());
    format!("(function() {{ {} }}).apply(null, {})", script, args)
}
