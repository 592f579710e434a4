//! Server-rendered HTML pages.

use posekit_core::pipeline::ProcessingOutcome;
use posekit_core::upload::MediaKind;

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
nav a{margin-right:1rem}.msg{padding:.75rem;border-radius:4px;background:#eef}\
.error{background:#fee;color:#900}.media{display:flex;gap:1rem;flex-wrap:wrap}\
.media figure{flex:1;min-width:280px;margin:0}.media img,.media video{max-width:100%}";

/// Escape text for inclusion in HTML content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <nav><a href=\"/index\">Home</a><a href=\"/pose\">Pose Estimation</a>\
         <a href=\"/logout\">Logout</a></nav>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

pub fn title_page() -> String {
    layout(
        "posekit",
        "<h1>posekit</h1>\n<p>Human pose estimation for images and videos.</p>\n\
         <p><a href=\"/index\">Enter</a></p>",
    )
}

pub fn index_page() -> String {
    layout(
        "Home",
        "<h1>Pose Estimation</h1>\n\
         <p>Upload a photo (.jpg, .jpeg, .png) or a video (.mp4). The detected body \
         landmarks are drawn onto the media and summarised in a PDF report.</p>\n\
         <p><a href=\"/login\">Log in</a> to get started.</p>",
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let alert = error
        .map(|e| format!("<p class=\"msg error\">{}</p>\n", escape_html(e)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Login</h1>\n{alert}\
         <form method=\"post\" action=\"/login\">\n\
         <label>Username <input name=\"username\" autocomplete=\"username\" required></label><br>\n\
         <label>Password <input name=\"password\" type=\"password\" \
         autocomplete=\"current-password\" required></label><br>\n\
         <button type=\"submit\">Log in</button>\n</form>"
    );
    layout("Login", &body)
}

/// The upload form, optionally with a status line and the artifacts of a
/// finished run.
pub fn pose_page(
    username: Option<&str>,
    message: Option<&str>,
    outcome: Option<&ProcessingOutcome>,
) -> String {
    let mut body = String::from("<h1>Pose Estimation</h1>\n");
    if let Some(user) = username {
        body.push_str(&format!("<p>Signed in as {}</p>\n", escape_html(user)));
    }
    if let Some(msg) = message {
        let class = if msg.starts_with('⚠') { "msg error" } else { "msg" };
        body.push_str(&format!("<p class=\"{class}\">{}</p>\n", escape_html(msg)));
    }
    body.push_str(
        "<form method=\"post\" action=\"/pose_backend\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".jpg,.jpeg,.png,.mp4\">\n\
         <button type=\"submit\">Upload &amp; Process</button>\n</form>\n",
    );
    if let Some(outcome) = outcome {
        body.push_str(&result_section(outcome));
    }
    layout("Pose Estimation", &body)
}

fn result_section(outcome: &ProcessingOutcome) -> String {
    let input = escape_html(&outcome.input_filename);
    let result = escape_html(&outcome.result_filename);
    let report = escape_html(&outcome.report_filename);
    let (input_media, result_media) = match outcome.kind {
        MediaKind::Image => (
            format!("<img src=\"/static/uploads/{input}\" alt=\"Uploaded image\">"),
            format!("<img src=\"/static/results/{result}\" alt=\"Annotated image\">"),
        ),
        MediaKind::Video => (
            format!("<video src=\"/static/uploads/{input}\" controls></video>"),
            format!("<video src=\"/static/results/{result}\" controls></video>"),
        ),
    };
    format!(
        "<section class=\"media\">\n\
         <figure>{input_media}<figcaption>Original</figcaption></figure>\n\
         <figure>{result_media}<figcaption>Pose landmarks</figcaption></figure>\n\
         </section>\n\
         <p><a href=\"/download/{result}\">Download result</a> \
         <a href=\"/download/{report}\">Download PDF report</a></p>\n"
    )
}
