use axum::response::Html;

/// Minimal sign-in form posting `token` to `/sign-in`.
pub fn sign_in_page(error: Option<&str>) -> Html<String> {
    let error_html = match error {
        Some(message) => format!(r#"<p class="error">{}</p>"#, escape_html(message)),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Tic Tac Toe - Sign in</title>
  <style>
    body {{ margin: 0; font-family: sans-serif; }}
    .navbar {{ padding: 10px; background-color: #4caf50; color: #fff; }}
    .navbar h1 {{ margin: 0; }}
    .sign-in {{ padding: 20px; text-align: center; }}
    .error {{ color: #c62828; }}
    input, button {{ padding: 8px; margin: 4px; border-radius: 5px; }}
  </style>
</head>
<body>
  <header class="navbar"><h1>Tic Tac Toe</h1></header>
  <main class="sign-in">
    <h2>Sign in to play</h2>
    {}
    <form method="post" action="/sign-in">
      <input type="password" name="token" placeholder="Access token" autofocus>
      <button type="submit">Sign in</button>
    </form>
  </main>
</body>
</html>
"#,
        error_html
    ))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
