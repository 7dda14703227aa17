//! Server-rendered pages for the catalog.

use axum::response::Html;
use std::fmt::Write;

use crate::model::{Book, format_date};

/// Replaces `&`, `<`, `>`, `"` and `'` with their HTML entities.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html>
    <head>
        <meta charset="utf-8">
        <title>{title}</title>
        <link rel="stylesheet" href="/static/style.css">
    </head>
    <body>
        <h1>{title}</h1>
{body}
    </body>
</html>
"#,
        title = escape_html(title),
        body = body,
    ))
}

pub fn render_index(books: &[Book]) -> Html<String> {
    let mut rows = String::new();
    for book in books {
        // writing into a String cannot fail
        let _ = write!(
            rows,
            r#"
                <tr>
                    <td>{title}</td>
                    <td>{author}</td>
                    <td>{date}</td>
                    <td><a href="/update-book?book_id={id}">Edit</a></td>
                    <td>
                        <form action="/delete-book" method="post">
                            <input type="hidden" name="book_id" value="{id}">
                            <input type="submit" value="Delete">
                        </form>
                    </td>
                </tr>"#,
            id = book.id,
            title = escape_html(&book.title),
            author = escape_html(&book.author),
            date = format_date(book.published_date),
        );
    }

    let body = format!(
        r#"        <table>
            <thead>
                <tr><th>Title</th><th>Author</th><th>Published</th><th></th><th></th></tr>
            </thead>
            <tbody>{rows}
            </tbody>
        </table>

        <h2>Add a book</h2>
        <form action="/add-cart" method="post">
            <label>Title <input type="text" name="title" required></label>
            <label>Author <input type="text" name="author" required></label>
            <label>Published <input type="date" name="published_date" required></label>
            <input type="submit" value="Add">
        </form>"#,
    );

    layout("Books", &body)
}

pub fn render_update(book: &Book) -> Html<String> {
    let body = format!(
        r#"        <form action="/perform-update" method="post">
            <input type="hidden" name="book_id" value="{id}">
            <label>Title <input type="text" name="title" value="{title}" required></label>
            <label>Author <input type="text" name="author" value="{author}" required></label>
            <label>Published <input type="date" name="published_date" value="{date}" required></label>
            <input type="submit" value="Save">
        </form>
        <p><a href="/">Back to the list</a></p>"#,
        id = book.id,
        title = escape_html(&book.title),
        author = escape_html(&book.author),
        date = format_date(book.published_date),
    );

    layout("Edit book", &body)
}
