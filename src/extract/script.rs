//! In-page snapshot script
//!
//! Evaluated with `returnByValue`; the result is decoded by [`super::snapshot`].

/// Function name embedded in the script, used to recognise it in call logs
pub const SNAPSHOT_MARKER: &str = "__chaserLensSnapshot";

/// Walks every element in document order and reports geometry, text and the
/// attributes the labels need. Elements with a skipped tag, and everything
/// inside them, are left out.
pub const PAGE_SNAPSHOT_SCRIPT: &str = r#"(function __chaserLensSnapshot() {
  const SKIP = new Set([
    'html', 'head', 'meta', 'link', 'title', 'base', 'script', 'style',
    'noscript', 'template', 'svg', 'path', 'g', 'defs', 'use', 'iframe',
    'frame', 'object', 'embed', 'param', 'source', 'track', 'br', 'wbr'
  ]);
  const FORM_TAGS = new Set(['input', 'textarea', 'select']);

  const collapse = (s) => (s || '').replace(/\s+/g, ' ').trim();

  // The element itself, or an ancestor below <html>, has a skipped tag
  const skipped = (el) => {
    if (SKIP.has(el.tagName.toLowerCase())) return true;
    for (let cur = el.parentElement; cur && cur !== document.documentElement; cur = cur.parentElement) {
      if (SKIP.has(cur.tagName.toLowerCase())) return true;
    }
    return false;
  };

  const ownText = (el) => {
    let out = '';
    for (const child of el.childNodes) {
      if (child.nodeType === Node.TEXT_NODE) out += ' ' + child.textContent;
    }
    return collapse(out);
  };

  const deepText = (el) => {
    let out = '';
    const walk = (node) => {
      for (const child of node.childNodes) {
        if (child.nodeType === Node.TEXT_NODE) {
          out += ' ' + child.textContent;
        } else if (child.nodeType === Node.ELEMENT_NODE && !SKIP.has(child.tagName.toLowerCase())) {
          walk(child);
        }
      }
    };
    walk(el);
    return collapse(out);
  };

  const attr = (el, name) => el.getAttribute(name);

  const nodes = [];
  for (const el of document.getElementsByTagName('*')) {
    if (skipped(el)) continue;

    const tag = el.tagName.toLowerCase();
    const r = el.getBoundingClientRect();
    const clickable = typeof el.onclick === 'function' || el.hasAttribute('onclick');
    const role = attr(el, 'role');
    const type = tag === 'input' ? (el.type || 'text') : attr(el, 'type');
    const isPassword = tag === 'input' && String(type).toLowerCase() === 'password';

    nodes.push({
      tag,
      rect: { x: r.x, y: r.y, width: r.width, height: r.height },
      ownText: ownText(el),
      deepText: (tag === 'a' || tag === 'button' || clickable || role !== null) ? deepText(el) : null,
      href: attr(el, 'href'),
      type,
      placeholder: attr(el, 'placeholder'),
      // Password contents never leave the page
      value: FORM_TAGS.has(tag) && !isPassword ? String(el.value ?? '') : null,
      name: attr(el, 'name'),
      alt: attr(el, 'alt'),
      src: attr(el, 'src'),
      role,
      hasClickHandler: clickable,
      options: tag === 'select' ? Array.from(el.options).map((o) => collapse(o.text)) : []
    });
  }

  return {
    viewport: {
      width: window.innerWidth,
      height: window.innerHeight,
      scrollX: window.scrollX,
      scrollY: window.scrollY
    },
    nodes
  };
})()"#;
