//! Fixed replies for greetings, thanks, farewells, abuse and noise.
//! None of these are scored; they short-circuit the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::lexicon::Lexicon;
use crate::role::Role;
use crate::text::{compose_response, pick_variant, strip_accents};

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("pattern is valid"));

const GREETING_VARIANTS: &[&str] = &[
    "¡Hola! ¿Qué tal?",
    "¡Hola! Bienvenido a EpicAnimes.",
    "¡Buenas! ¿En qué puedo ayudarte hoy?",
];

const SMALL_TALK_VARIANTS: &[&str] = &[
    "Todo bien por aquí, listo para ayudarte.",
    "Muy bien, ¿y tú? Cuéntame en qué te apoyo.",
    "Todo tranquilo en EpicAnimes; dime qué necesitas.",
];

/// A frequently asked question shown as a quick hint.
#[derive(Debug, Clone, Copy)]
pub struct Hint {
    pub question: &'static str,
    pub answer: &'static str,
}

pub fn greeting_segments(role: Role) -> [&'static str; 3] {
    match role {
        Role::Administrator => [
            "Veo que eres administrador; puedo ayudarte a navegar informes y tareas operativas.",
            "Te acompaño con dashboards, usuarios, vendedores y configuraciones globales.",
            "¿En qué proceso necesitas apoyo hoy?",
        ],
        Role::Seller => [
            "Estás en el modo vendedor certificado de EpicAnimes.",
            "Gestionemos productos, stock, alertas críticas y métricas del dashboard.",
            "Recuerda que avisamos cuando tu stock baja de 5 unidades.",
        ],
        Role::Buyer => [
            "Veo tu sesión como comprador registrado.",
            "Te ayudo con compras, envíos, devoluciones y métodos de pago.",
            "Si buscas un pedido revisa Mis compras o el correo de confirmación.",
        ],
        Role::Anonymous => [
            "Bienvenido a EpicAnimes, la tienda online de coleccionables de anime.",
            "Puedes registrarte o iniciar sesión desde el menú principal para guardar tus pedidos.",
            "Pregúntame lo que necesites sobre catálogo o registro.",
        ],
    }
}

pub fn help_hints(role: Role) -> [Hint; 3] {
    match role {
        Role::Anonymous => [
            Hint {
                question: "¿Qué es EpicAnimes?",
                answer: "Es una tienda online especializada en productos de anime, figuras, poleras, posters y mucho más.",
            },
            Hint {
                question: "¿Necesito una cuenta para comprar?",
                answer: "Sí, debes registrarte o iniciar sesión para poder finalizar tus compras y recibir seguimiento del pedido.",
            },
            Hint {
                question: "¿Cuál es el horario de atención?",
                answer: "Atendemos todos los días de 09:00 a 21:00 hrs. Fuera de horario te responderemos al siguiente día hábil.",
            },
        ],
        Role::Buyer => [
            Hint {
                question: "¿Cómo hago seguimiento a mi pedido?",
                answer: "Revisa el correo de confirmación o entra a 'Mis compras' en tu panel para ver el número de seguimiento.",
            },
            Hint {
                question: "¿Cuánto tarda el envío?",
                answer: "En Santiago entre 24 y 48 horas hábiles; en regiones, de 3 a 5 días hábiles.",
            },
            Hint {
                question: "¿Qué hago si mi producto llega dañado?",
                answer: "Escríbenos dentro de 5 días con fotos y el número de orden para coordinar cambio o reembolso.",
            },
        ],
        Role::Seller => [
            Hint {
                question: "¿Cómo agrego un producto?",
                answer: "En tu Dashboard Vendedor, entra a 'Mis productos' y presiona 'Agregar nuevo'.",
            },
            Hint {
                question: "¿Qué significa stock crítico?",
                answer: "Es una alerta automática cuando el inventario baja de 5 unidades para que repongas stock.",
            },
            Hint {
                question: "¿Dónde veo mis ventas?",
                answer: "En tu Dashboard puedes revisar tus ventas totales, productos más vendidos y métricas diarias.",
            },
        ],
        Role::Administrator => [
            Hint {
                question: "¿Dónde veo las métricas globales?",
                answer: "Desde el Dashboard Administrador, donde verás ventas, usuarios activos y desempeño por vendedor.",
            },
            Hint {
                question: "¿Cómo gestiono reportes del sistema?",
                answer: "En la sección 'Reportes' puedes revisar errores o reclamos y marcarlos como resueltos.",
            },
            Hint {
                question: "¿Puedo enviar notificaciones a todos los vendedores?",
                answer: "Sí, desde el panel de administración puedes enviar avisos o correos masivos a todos los vendedores activos.",
            },
        ],
    }
}

/// Role greeting opened by a variant chosen from `seed` (the raw query).
pub fn role_greeting(role: Role, seed: &str) -> String {
    let seed = if seed.is_empty() { role.label() } else { seed };
    let opener = pick_variant(GREETING_VARIANTS, seed);
    let segments = greeting_segments(role);
    compose_response(&[opener, segments[0], segments[1], segments[2]])
}

pub fn role_help_message(role: Role) -> String {
    let lines: Vec<String> = help_hints(role)
        .iter()
        .map(|hint| format!("{} {}", hint.question, hint.answer))
        .collect();
    compose_response(&lines)
}

/// Checks the query against the canned tables in priority order.
/// Returns `None` when nothing fires so the pipeline can continue.
pub fn canned_response(question: &str, role: Role, lexicon: &Lexicon) -> Option<String> {
    let lowered = strip_accents(&question.to_lowercase());
    let normalized = crate::text::normalize(&lowered);
    let cleaned = NON_ALNUM.replace_all(&normalized, " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    if tokens.is_empty() {
        return Some(compose_response(&[
            "Parece que solo enviaste signos o espacios.",
            "Cuéntame tu pregunta sobre EpicAnimes y con gusto respondo.",
        ]));
    }

    let token_set: HashSet<&str> = tokens.iter().copied().collect();
    let hits = |words: &HashSet<String>| token_set.iter().any(|t| words.contains(*t));

    if hits(&lexicon.offensive) {
        return Some(compose_response(&[
            "Prefiero mantener una conversación respetuosa.",
            "¿Deseas que te ayude con algo relacionado con EpicAnimes?",
        ]));
    }
    if hits(&lexicon.thanks) {
        return Some(compose_response(&[
            "¡Gracias a ti!",
            "¿Hay algo más en lo que pueda ayudarte en EpicAnimes?",
        ]));
    }
    if hits(&lexicon.help) {
        return Some(role_help_message(role));
    }
    if lexicon.farewells.iter().any(|p| normalized.contains(p.as_str())) {
        return Some(compose_response(&[
            "¡Hasta luego, que tengas un gran día!",
            "Si necesitas algo más de EpicAnimes, aquí estaré.",
        ]));
    }
    if lexicon.small_talk.iter().any(|p| normalized.contains(p.as_str())) {
        let reply = pick_variant(SMALL_TALK_VARIANTS, question);
        return Some(compose_response(&[reply, "¿En qué puedo ayudarte hoy?"]));
    }

    let cleaned = tokens.join(" ");
    let padded = format!(" {} ", cleaned);
    let greets = lexicon
        .greetings
        .iter()
        .any(|k| cleaned.starts_with(k.as_str()) || padded.contains(&format!(" {} ", k)));
    if greets {
        return Some(role_greeting(role, question));
    }

    let short_noise = tokens.len() <= 2 && tokens.iter().all(|t| t.chars().count() <= 2);
    let distinct_chars: HashSet<char> = tokens.iter().flat_map(|t| t.chars()).collect();
    if short_noise || distinct_chars.len() == 1 {
        return Some(compose_response(&[
            "Parece que escribiste pocos caracteres.",
            "Dime tu duda sobre productos, envíos o soporte y te respondo de inmediato.",
        ]));
    }
    None
}
