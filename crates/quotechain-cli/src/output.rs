//! Quote rendering: labeled text block or JSON.

use quotechain_core::AnnotatedQuote;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    annotated: &AnnotatedQuote,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            print!("{}", text_block(annotated));
            Ok(())
        }
        OutputFormat::Json => {
            let rendered = if pretty {
                serde_json::to_string_pretty(annotated)?
            } else {
                serde_json::to_string(annotated)?
            };
            println!("{rendered}");
            Ok(())
        }
    }
}

fn text_block(annotated: &AnnotatedQuote) -> String {
    let quote = &annotated.quote;
    format!(
        "股票名称: {}\n开盘价: {}\n收盘价: {}\n最高价: {}\n最低价: {}\n成交量: {}\n数据来源: {} | 获取时间: {}\n",
        quote.name,
        quote.open,
        quote.close,
        quote.high,
        quote.low,
        quote.volume,
        annotated.source,
        annotated.fetched_at.render(),
    )
}
