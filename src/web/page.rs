pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Lumira</title>
  <link rel="stylesheet" href="/static/style.css">
</head>
<body>
  <aside id="sidebar">
    <div class="sidebar-header">
      <span class="brand">Lumira</span>
      <button id="new-dialog" title="Новый диалог">+</button>
    </div>
    <ul id="dialogs"></ul>
  </aside>
  <main>
    <header id="dialog-header">
      <h1 id="dialog-title"></h1>
      <div class="actions">
        <button id="rename-dialog">Переименовать</button>
        <button id="delete-dialog">Удалить</button>
      </div>
    </header>
    <section id="messages"></section>
    <form id="composer">
      <label class="upload" title="Распознать текст с изображения">
        <input id="ocr-file" type="file" accept="image/*,application/pdf">
        &#128247;
      </label>
      <textarea id="input" rows="2" placeholder="Спросите что-нибудь, попросите тест или напишите «прогресс»"></textarea>
      <button type="submit" id="send">Отправить</button>
    </form>
  </main>
  <script>
    const state = { dialogId: null, busy: false };
    const $ = (id) => document.getElementById(id);

    async function api(path, options = {}) {
      const response = await fetch(path, {
        headers: { "Content-Type": "application/json" },
        ...options,
      });
      const body = await response.json().catch(() => ({}));
      if (!response.ok) {
        throw new Error(body.detail || response.statusText);
      }
      return body;
    }

    function addMessage(role, content) {
      const item = document.createElement("div");
      item.className = "message " + role;
      item.textContent = content;
      $("messages").appendChild(item);
      $("messages").scrollTop = $("messages").scrollHeight;
      return item;
    }

    async function loadDialogs() {
      const dialogs = await api("/dialogs");
      const list = $("dialogs");
      list.innerHTML = "";
      for (const dialog of dialogs) {
        const item = document.createElement("li");
        item.textContent = dialog.title;
        item.dataset.id = dialog.id;
        if (dialog.id === state.dialogId) item.classList.add("active");
        item.addEventListener("click", () => openDialog(dialog.id));
        list.appendChild(item);
      }
      if (state.dialogId === null && dialogs.length > 0) {
        await openDialog(dialogs[0].id);
      }
    }

    async function openDialog(id) {
      const data = await api(`/dialogs/${id}/messages`);
      state.dialogId = data.dialog.id;
      $("dialog-title").textContent = data.dialog.title;
      $("messages").innerHTML = "";
      for (const message of data.messages) addMessage(message.role, message.content);
      for (const item of $("dialogs").children) {
        item.classList.toggle("active", Number(item.dataset.id) === state.dialogId);
      }
    }

    async function send(event) {
      event.preventDefault();
      const text = $("input").value.trim();
      if (!text || state.busy || state.dialogId === null) return;
      state.busy = true;
      $("input").value = "";
      addMessage("user", text);
      const pending = addMessage("assistant pending", "Думаю…");
      try {
        const data = await api("/chat", {
          method: "POST",
          body: JSON.stringify({ dialog_id: state.dialogId, message: text }),
        });
        pending.className = "message assistant";
        pending.textContent = data.answer;
        await loadDialogs();
      } catch (error) {
        pending.className = "message error";
        pending.textContent = error.message;
      } finally {
        state.busy = false;
      }
    }

    function readAsBase64(file) {
      return new Promise((resolve, reject) => {
        const reader = new FileReader();
        reader.onload = () => resolve(String(reader.result).split(",").pop());
        reader.onerror = () => reject(reader.error);
        reader.readAsDataURL(file);
      });
    }

    async function uploadImage() {
      const file = $("ocr-file").files[0];
      $("ocr-file").value = "";
      if (!file || state.busy || state.dialogId === null) return;
      state.busy = true;
      addMessage("user", `[Изображение: ${file.name}]`);
      const pending = addMessage("assistant pending", "Распознаю текст…");
      try {
        const content = await readAsBase64(file);
        const data = await api(`/dialogs/${state.dialogId}/ocr`, {
          method: "POST",
          body: JSON.stringify({ filename: file.name, content_base64: content }),
        });
        pending.className = "message assistant";
        pending.textContent = data.answer;
      } catch (error) {
        pending.className = "message error";
        pending.textContent = error.message;
      } finally {
        state.busy = false;
      }
    }

    $("composer").addEventListener("submit", send);
    $("input").addEventListener("keydown", (event) => {
      if (event.key === "Enter" && !event.shiftKey) send(event);
    });
    $("ocr-file").addEventListener("change", uploadImage);

    $("new-dialog").addEventListener("click", async () => {
      const dialog = await api("/dialogs", { method: "POST", body: "{}" });
      state.dialogId = dialog.id;
      await loadDialogs();
      await openDialog(dialog.id);
    });

    $("rename-dialog").addEventListener("click", async () => {
      if (state.dialogId === null) return;
      const title = prompt("Новое название диалога", $("dialog-title").textContent);
      if (title === null) return;
      await api(`/dialogs/${state.dialogId}`, {
        method: "PATCH",
        body: JSON.stringify({ title }),
      });
      await loadDialogs();
      await openDialog(state.dialogId);
    });

    $("delete-dialog").addEventListener("click", async () => {
      if (state.dialogId === null || !confirm("Удалить диалог?")) return;
      await api(`/dialogs/${state.dialogId}`, { method: "DELETE" });
      state.dialogId = null;
      await loadDialogs();
    });

    loadDialogs().catch((error) => addMessage("error", error.message));
  </script>
</body>
</html>
"#;

pub const STYLE_CSS: &str = r#":root {
  --bg: #f6f5fb;
  --panel: #ffffff;
  --accent: #6c5ce7;
  --muted: #8a8799;
  --user: #e9e6ff;
  --assistant: #ffffff;
  --error: #ffe3e3;
}

* { box-sizing: border-box; }

body {
  margin: 0;
  height: 100vh;
  display: flex;
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  background: var(--bg);
  color: #222;
}

#sidebar {
  width: 260px;
  background: var(--panel);
  border-right: 1px solid #e4e2ee;
  display: flex;
  flex-direction: column;
}

.sidebar-header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  padding: 16px;
}

.brand { font-weight: 700; font-size: 20px; color: var(--accent); }

#dialogs { list-style: none; margin: 0; padding: 0; overflow-y: auto; }

#dialogs li {
  padding: 10px 16px;
  cursor: pointer;
  white-space: nowrap;
  overflow: hidden;
  text-overflow: ellipsis;
}

#dialogs li:hover { background: var(--bg); }
#dialogs li.active { background: var(--user); font-weight: 600; }

main { flex: 1; display: flex; flex-direction: column; min-width: 0; }

#dialog-header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  padding: 12px 20px;
  border-bottom: 1px solid #e4e2ee;
  background: var(--panel);
}

#dialog-header h1 { font-size: 18px; margin: 0; }

#messages {
  flex: 1;
  overflow-y: auto;
  padding: 20px;
  display: flex;
  flex-direction: column;
  gap: 12px;
}

.message {
  max-width: 75%;
  padding: 10px 14px;
  border-radius: 12px;
  white-space: pre-wrap;
  line-height: 1.4;
}

.message.user { align-self: flex-end; background: var(--user); }
.message.assistant { align-self: flex-start; background: var(--assistant); border: 1px solid #e4e2ee; }
.message.pending { color: var(--muted); font-style: italic; }
.message.error { align-self: center; background: var(--error); }

#composer {
  display: flex;
  gap: 8px;
  padding: 12px 20px;
  background: var(--panel);
  border-top: 1px solid #e4e2ee;
}

#composer textarea {
  flex: 1;
  resize: none;
  padding: 8px 10px;
  border-radius: 8px;
  border: 1px solid #d6d3e4;
  font: inherit;
}

.upload { display: flex; align-items: center; cursor: pointer; font-size: 22px; }
.upload input { display: none; }

button {
  border: none;
  border-radius: 8px;
  padding: 8px 14px;
  background: var(--accent);
  color: #fff;
  cursor: pointer;
  font: inherit;
}

button:hover { opacity: 0.9; }
"#;
