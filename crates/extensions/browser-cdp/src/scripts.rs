//! JavaScript run inside site frames.
//!
//! Everything except [`FRAME_GUARD`] runs in the isolated automation world,
//! through `Runtime.callFunctionOn` with `this` bound to the target element.

/// Message types of the main-world Quill bridge.
pub const QUILL_INJECT: &str = "CHATCAST_QUILL_INJECT";
pub const QUILL_RESULT: &str = "CHATCAST_QUILL_INJECT_RESULT";

/// Main-world script for every document of the batch tab.
///
/// Inside frames it pins `top`/`parent` to the frame itself, hides
/// `frameElement`, and serves Quill commits posted from the automation world.
pub const FRAME_GUARD: &str = r#"(() => {
  let realTop;
  try { realTop = window.top; } catch (e) { realTop = null; }
  if (window.self === realTop) return;

  for (const [prop, getter] of [
    ["top", () => window.self],
    ["parent", () => window.self],
    ["frameElement", () => null],
  ]) {
    try {
      Object.defineProperty(window, prop, { get: getter, configurable: false, enumerable: true });
    } catch (e) {}
  }

  window.addEventListener("message", (event) => {
    const msg = event.data;
    if (!msg || msg.type !== "CHATCAST_QUILL_INJECT") return;
    const reply = (success) =>
      window.postMessage({ type: "CHATCAST_QUILL_INJECT_RESULT", requestId: msg.requestId, success }, "*");

    const container = document.querySelector(".ql-container");
    const quill = container && container.__quill;
    if (!quill) { reply(false); return; }

    quill.focus();
    const len = quill.getLength();
    if (len > 1) quill.deleteText(0, len, "user");
    quill.insertText(0, msg.text, "user");
    quill.setSelection(quill.getLength() - 1);

    let attempts = 0;
    const poll = setInterval(() => {
      attempts++;
      const send = document.querySelector("button.send, .send-button-container button");
      if (send && send.offsetParent !== null) {
        clearInterval(poll);
        send.click();
        reply(true);
        return;
      }
      if (attempts >= 30) { clearInterval(poll); reply(false); }
    }, 100);
  });
})();"#;

pub const LOCATION: &str = "location.href";

pub const FOCUS: &str = "function() { this.focus(); }";

pub const CLICK: &str = "function() { this.click(); }";

pub const IS_DISABLED: &str = "function() { return !!this.disabled; }";

/// `(value, native)`; `native` goes through the prototype's `value` setter.
pub const SET_VALUE: &str = r#"function(value, native) {
  if (native) {
    const proto = this instanceof HTMLTextAreaElement
      ? HTMLTextAreaElement.prototype
      : HTMLInputElement.prototype;
    const desc = Object.getOwnPropertyDescriptor(proto, "value");
    if (desc && desc.set) { desc.set.call(this, value); return; }
  }
  this.value = value;
}"#;

pub const READ_VALUE: &str = r#"function() { return this.value || this.innerText || ""; }"#;

/// `(spec)` where `spec` is a serialized synthetic event. Without an element
/// receiver the event goes to `document.activeElement`, if any.
pub const DISPATCH: &str = r#"function(spec) {
  const target = this && this.nodeType === 1 ? this : document.activeElement;
  if (!target) return false;
  const init = { bubbles: true, cancelable: true };
  let event;
  switch (spec.kind) {
    case "input":
      event = new InputEvent(spec.name, { ...init, inputType: spec.inputType, data: spec.data });
      break;
    case "composition":
      event = new CompositionEvent(spec.name, { ...init, data: spec.data ?? undefined });
      break;
    case "key": {
      const s = spec.stroke;
      event = new KeyboardEvent(spec.name, {
        ...init, key: s.key, code: s.code, keyCode: s.keyCode, which: s.keyCode,
        ctrlKey: s.ctrl, shiftKey: s.shift, metaKey: s.meta, altKey: s.alt,
      });
      break;
    }
    case "pasteText": {
      const dt = new DataTransfer();
      dt.setData("text/plain", spec.text);
      event = new ClipboardEvent("paste", { ...init, clipboardData: dt });
      break;
    }
    case "pasteFiles": {
      const dt = new DataTransfer();
      for (const f of spec.files) {
        const bin = atob(f.data);
        const bytes = new Uint8Array(bin.length);
        for (let i = 0; i < bin.length; i++) bytes[i] = bin.charCodeAt(i);
        dt.items.add(new File([bytes], f.fileName, { type: f.type }));
      }
      event = new ClipboardEvent("paste", { ...init, clipboardData: dt });
      break;
    }
    default:
      event = new Event(spec.name, init);
  }
  target.dispatchEvent(event);
  return true;
}"#;

pub const EXEC_INSERT_TEXT: &str = r#"function(text) {
  this.focus();
  const range = document.createRange();
  range.selectNodeContents(this);
  const sel = window.getSelection();
  sel.removeAllRanges();
  sel.addRange(range);
  return document.execCommand("insertText", false, text);
}"#;

/// `(mode, text)` with `mode` either `lexical` or `paragraph`.
pub const RESET_CONTENT: &str = r#"function(mode, text) {
  const ps = Array.from(this.querySelectorAll("p"));
  ps.slice(1).forEach((p) => p.remove());
  let p = ps[0];
  if (mode === "lexical") {
    if (!p) { p = document.createElement("p"); this.appendChild(p); }
    p.replaceChildren();
    if (text.trim()) {
      const span = document.createElement("span");
      span.setAttribute("data-lexical-text", "true");
      span.textContent = text;
      p.appendChild(span);
    }
  } else if (p) {
    p.classList.remove("is-empty", "is-editor-empty");
    p.textContent = text;
  } else {
    this.replaceChildren();
    p = document.createElement("p");
    p.textContent = text;
    this.appendChild(p);
  }
}"#;

/// `(text, timeoutMs)`: post to the main-world bridge and wait for its answer.
pub const QUILL_BRIDGE: &str = r#"function(text, timeoutMs) {
  if (!document.querySelector(".ql-editor")) return Promise.resolve(false);
  const requestId = "quill_" + Date.now() + "_" + Math.random().toString(36).slice(2, 8);
  return new Promise((resolve) => {
    const timer = setTimeout(() => { window.removeEventListener("message", onReply); resolve(false); }, timeoutMs);
    function onReply(event) {
      const msg = event.data;
      if (!msg || msg.type !== "CHATCAST_QUILL_INJECT_RESULT" || msg.requestId !== requestId) return;
      clearTimeout(timer);
      window.removeEventListener("message", onReply);
      resolve(msg.success === true);
    }
    window.addEventListener("message", onReply);
    window.postMessage({ type: "CHATCAST_QUILL_INJECT", text, requestId }, "*");
  });
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_message_types_agree() {
        for script in [FRAME_GUARD, QUILL_BRIDGE] {
            assert!(script.contains(QUILL_INJECT));
            assert!(script.contains(QUILL_RESULT));
        }
    }

    #[test]
    fn test_dispatch_covers_every_event_kind() {
        use chatcast_automation::{KeyStroke, SyntheticEvent};
        let kinds = [
            SyntheticEvent::event("change"),
            SyntheticEvent::input("insertText", "x"),
            SyntheticEvent::composition("compositionend", Some("x")),
            SyntheticEvent::key("keydown", KeyStroke::parse("Enter")),
            SyntheticEvent::PasteText { text: "x".into() },
            SyntheticEvent::PasteFiles { files: vec![] },
        ];
        for event in kinds {
            let spec = serde_json::to_value(&event).unwrap();
            let kind = spec["kind"].as_str().unwrap().to_string();
            if kind != "event" {
                assert!(DISPATCH.contains(&format!("case \"{}\"", kind)), "{}", kind);
            }
        }
    }
}
