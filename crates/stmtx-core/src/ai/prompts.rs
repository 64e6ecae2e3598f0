//! Prompt text sent to the completion backend.

use crate::bank::BankLabel;

pub const EXTRACTION_SYSTEM: &str = "You are an expert financial document analyzer. \
Your task is to extract transaction information from bank statements with high accuracy.";

/// Prompt for one chunk of the primary extraction.
pub fn extraction_prompt(text: &str, bank: BankLabel, chunk: usize, total: usize) -> String {
    format!(
        r#"You are analyzing a bank statement from {bank}. This is chunk {chunk} of {total}.

Extract ALL financial transactions from this text. A transaction has:
- Date (when the transaction occurred)
- Description (what the transaction was for)
- Amount (positive for credits/deposits, negative for charges/withdrawals)

Guidelines:
1. Look for rows with a date, a description and an amount.
2. Dates look like DD-MMM-YYYY, DD/MM/YYYY or YYYY-MM-DD.
3. Amounts usually carry $, +, - or a currency code.
4. Ignore balances, interest-rate disclosures, minimum payment notices and totals.

TEXT TO ANALYZE:
{text}

Return ONLY a JSON array in this exact format:
[
  {{
    "fecha_operacion": "DD-MMM-YYYY",
    "descripcion": "Transaction description",
    "monto": -123.45,
    "categoria": "auto_categorized"
  }}
]

If no transactions are found, return an empty array: []"#
    )
}

/// Single-shot prompt of the legacy extraction.
pub fn legacy_prompt(text: &str) -> String {
    format!(
        r#"Eres un experto en análisis de estados de cuenta bancarios mexicanos. Extrae TODAS las transacciones del texto.

INSTRUCCIONES:
1. Reconoce fechas DD/MM/YYYY, DD-MMM-YYYY y DD-MM-YYYY.
2. Reconoce montos como $1,234.56, 1234.56 o -1234.56.
3. Los cargos (gastos) son NEGATIVOS y los abonos (ingresos) son POSITIVOS.
4. Incluye compras, retiros, depósitos, transferencias, comisiones e intereses.
5. Patrones frecuentes: 'SU PAGO GRACIAS SPEI', 'COMPRA TARJETA', 'RETIRO CAJERO', 'DEPOSITO EFECTIVO', 'COMISION', 'TRANSFERENCIA SPEI', 'PAGO SERVICIOS'.
6. No incluyas saldos, tasas de interés, pagos mínimos ni límites de crédito.

FORMATO DE SALIDA (solo JSON, sin texto adicional):
[
  {{
    "fecha_operacion": "DD-MMM-YYYY",
    "fecha_cargo": "DD-MMM-YYYY",
    "descripcion": "Descripción completa de la transacción",
    "monto": -1234.56
  }}
]

EJEMPLOS:
- Fecha: 07-May-2025, Descripción: "SU PAGO GRACIAS SPEI A CTA CLABE XXXXXXXX1179", Monto: 20000.00
- Fecha: 21-Abr-2025, Descripción: "ME 010517AEA VINOTECA SAN JERONIMO MON", Monto: -310.63
- Fecha: 07-May-2025, Descripción: "UBER *TRIP 8005928996 CA", Monto: -340.00

Si no hay transacciones claras, devuelve [].

TEXTO DEL ESTADO DE CUENTA:
{text}"#
    )
}

/// Prompt asking for a single category label.
pub fn category_prompt(description: &str, categories: &[&str]) -> String {
    format!(
        "Classify this bank transaction description into exactly one of these categories: {}.\n\
         Answer with the category name only.\n\nDescription: {}",
        categories.join(", "),
        description
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_context() {
        let prompt = extraction_prompt("05-Jun-2025 OXXO - $150.00", BankLabel::Hsbc, 2, 3);
        assert!(prompt.contains("from HSBC"));
        assert!(prompt.contains("chunk 2 of 3"));
        assert!(prompt.contains("05-Jun-2025 OXXO"));
        assert!(prompt.contains("\"fecha_operacion\""));
    }

    #[test]
    fn test_legacy_prompt_embeds_text() {
        assert!(legacy_prompt("TEXTO X").ends_with("TEXTO X"));
    }
}
