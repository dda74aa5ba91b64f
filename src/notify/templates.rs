//! HTML emails sent during the booking lifecycle.

use crate::config::EmailBranding;
use crate::notify::traits::Email;
use chrono::NaiveDate;
use scraper::{Html, Selector};

/// Data for the provider's "new booking request" email
#[derive(Debug, Clone)]
pub struct BookingRequestEmail<'a> {
    pub property_title: &'a str,
    pub property_location: &'a str,
    pub guest_name: &'a str,
    pub guest_email: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
    pub message: Option<&'a str>,
}

/// Data for the guest's "booking confirmed" email
#[derive(Debug, Clone)]
pub struct BookingConfirmedEmail<'a> {
    pub property_title: &'a str,
    pub property_location: &'a str,
    pub provider_name: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: f64,
}

const REQUEST_ACCENT: &str = "#667eea";
const CONFIRMED_ACCENT: &str = "#10b981";

pub fn booking_request(to: &str, data: &BookingRequestEmail<'_>, brand: &EmailBranding) -> Email {
    let message_card = data
        .message
        .filter(|m| !m.trim().is_empty())
        .map(|m| {
            card(
                REQUEST_ACCENT,
                "Message from Guest",
                &format!(r#"<p style="font-style: italic;">{}</p>"#, escape_html(m)),
            )
        })
        .unwrap_or_default();

    let body = format!(
        "{intro}{property}{guest}{booking}{message_card}{button}{outro}",
        intro = paragraph("You have received a new booking request for your property."),
        property = card(
            REQUEST_ACCENT,
            "Property Details",
            &[
                field("Property", data.property_title),
                field("Location", data.property_location),
            ]
            .concat(),
        ),
        guest = card(
            REQUEST_ACCENT,
            "Guest Information",
            &[
                field("Name", data.guest_name),
                field("Email", data.guest_email),
            ]
            .concat(),
        ),
        booking = card(
            REQUEST_ACCENT,
            "Booking Details",
            &stay_fields(data.start_date, data.end_date, data.total_amount, REQUEST_ACCENT),
        ),
        button = button(
            REQUEST_ACCENT,
            &format!("{}/dashboard/bookings", brand.app_url.trim_end_matches('/')),
            "View Booking Details",
        ),
        outro = format!(
            "{}{}",
            footnote("Please log in to your dashboard to accept or reject this booking request."),
            footnote(&format!("Best regards,<br>{} Team", escape_html(&brand.brand_name))),
        ),
    );

    Email {
        to: to.to_string(),
        subject: format!("New Booking Request for {}", data.property_title),
        html: layout(
            "New Booking Request",
            "New Booking Request",
            "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
            &body,
        ),
    }
}

pub fn booking_confirmed(
    to: &str,
    data: &BookingConfirmedEmail<'_>,
    brand: &EmailBranding,
) -> Email {
    let body = format!(
        "{intro}{property}{booking}{banner}{button}{outro}",
        intro = paragraph("Great news! Your booking request has been confirmed by the rental provider."),
        property = card(
            CONFIRMED_ACCENT,
            "Property Details",
            &[
                field("Property", data.property_title),
                field("Location", data.property_location),
                field("Property Owner", data.provider_name),
            ]
            .concat(),
        ),
        booking = card(
            CONFIRMED_ACCENT,
            "Booking Details",
            &stay_fields(data.start_date, data.end_date, data.total_amount, CONFIRMED_ACCENT),
        ),
        banner = format!(
            r#"<div style="background: #e0f2fe; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid {CONFIRMED_ACCENT};"><p style="margin: 0; font-weight: bold; color: #059669;">Your booking is confirmed! We're excited to host you.</p></div>"#
        ),
        button = button(
            CONFIRMED_ACCENT,
            &format!("{}/bookings", brand.app_url.trim_end_matches('/')),
            "View My Bookings",
        ),
        outro = format!(
            "{}{}",
            footnote("If you have any questions or need to make changes to your booking, please contact the property owner or our support team."),
            footnote(&format!(
                "We look forward to serving you!<br><strong>{} Team</strong>",
                escape_html(&brand.brand_name)
            )),
        ),
    );

    Email {
        to: to.to_string(),
        subject: format!("Booking Confirmed: {}", data.property_title),
        html: layout(
            "Booking Confirmed",
            "Booking Confirmed!",
            "linear-gradient(135deg, #10b981 0%, #059669 100%)",
            &body,
        ),
    }
}

/// Long English date, e.g. "Saturday, 1 June 2024"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

/// Rupee amount rounded to whole units with Indian digit grouping,
/// e.g. `1234567.6` becomes "₹12,34,568"
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{tail}", groups.join(","))
    };

    format!("{sign}₹{grouped}")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Visible text of an HTML email, one line per text node
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let lines: Vec<String> = match Selector::parse("body") {
        Ok(selector) => document
            .select(&selector)
            .flat_map(|body| body.text())
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect(),
        Err(_) => document
            .root_element()
            .text()
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect(),
    };
    lines.join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn stay_fields(start: NaiveDate, end: NaiveDate, total_amount: f64, accent: &str) -> String {
    format!(
        r#"{}{}<p><strong>Total Amount:</strong> <span style="font-size: 20px; color: {accent}; font-weight: bold;">{}</span></p>"#,
        field("Check-in Date", &format_long_date(start)),
        field("Check-out Date", &format_long_date(end)),
        format_inr(total_amount),
    )
}

fn field(label: &str, value: &str) -> String {
    format!("<p><strong>{label}:</strong> {}</p>", escape_html(value))
}

fn paragraph(text: &str) -> String {
    format!(r#"<p style="font-size: 16px; margin-bottom: 20px;">{text}</p>"#)
}

fn footnote(html: &str) -> String {
    format!(r#"<p style="font-size: 14px; color: #666; margin-top: 20px;">{html}</p>"#)
}

fn card(accent: &str, heading: &str, content: &str) -> String {
    format!(
        r#"<div style="background: white; padding: 20px; border-radius: 8px; margin: 20px 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1);"><h2 style="color: {accent}; margin-top: 0;">{heading}</h2>{content}</div>"#
    )
}

fn button(accent: &str, href: &str, label: &str) -> String {
    format!(
        r#"<div style="text-align: center; margin: 30px 0;"><a href="{}" style="display: inline-block; background: {accent}; color: white; padding: 15px 30px; text-decoration: none; border-radius: 5px; font-weight: bold;">{label}</a></div>"#,
        escape_html(href)
    )
}

fn layout(title: &str, heading: &str, header_background: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
  </head>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: {header_background}; padding: 30px; text-align: center; border-radius: 10px 10px 0 0;">
      <h1 style="color: white; margin: 0;">{heading}</h1>
    </div>
    <div style="background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px;">
      <p style="font-size: 16px; margin-bottom: 20px;">Hello,</p>
      {body}
    </div>
  </body>
</html>
"#
    )
}
