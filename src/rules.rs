//! Keyword/phrase rule tables. First satisfying rule wins.

use std::collections::HashSet;

use crate::role::Role;
use crate::text::{compose_response, normalize};

#[derive(Debug, Clone, Default)]
pub struct Rule {
    /// Empty means every role.
    pub roles: Vec<Role>,
    /// Every one of these tokens must be present.
    pub all: Vec<&'static str>,
    /// At least one of these tokens must be present.
    pub any: Vec<&'static str>,
    /// At least one phrase must appear in the normalised query.
    pub phrases: Vec<&'static str>,
    pub response: Vec<&'static str>,
}

impl Rule {
    fn matches(&self, normalized_question: &str, tokens: &HashSet<String>, role: Role) -> bool {
        if !self.roles.is_empty() && !self.roles.contains(&role) {
            return false;
        }
        if !self.all.iter().all(|t| tokens.contains(&normalize(t))) {
            return false;
        }
        if !self.any.is_empty() && !self.any.iter().any(|t| tokens.contains(&normalize(t))) {
            return false;
        }
        if !self.phrases.is_empty()
            && !self.phrases.iter().any(|p| normalized_question.contains(&normalize(p)))
        {
            return false;
        }
        !self.response.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    confidence: f32,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, confidence: f32) -> Self {
        Self { rules, confidence }
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Composed reply of the first rule the query satisfies.
    pub fn find(&self, question: &str, tokens: &[String], role: Role) -> Option<String> {
        if question.trim().is_empty() {
            return None;
        }
        let normalized_question = normalize(question);
        let token_set: HashSet<String> = tokens.iter().map(|t| normalize(t)).collect();
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized_question, &token_set, role))
            .map(|rule| compose_response(&rule.response))
    }

    /// General storefront rules, valid for every role.
    pub fn faq_rules() -> Self {
        Self::new(
            vec![
                Rule {
                    phrases: vec!["recomiendame algo", "recomiendame"],
                    response: vec![
                        "Depende de tus gustos: tenemos figuras, poleras, posters y accesorios.",
                        "Dime tu anime favorito y te sugiero algo puntual.",
                    ],
                    ..Default::default()
                },
                Rule {
                    any: vec!["pago", "pagar", "pagos"],
                    response: vec![
                        "Aceptamos tarjeta, transferencia bancaria y MercadoPago.",
                        "Elige el medio preferido durante el checkout.",
                    ],
                    ..Default::default()
                },
            ],
            0.4,
        )
    }

    /// Role-scoped deep links into the dashboards.
    pub fn role_dialog_rules() -> Self {
        Self::new(
            vec![
                Rule {
                    roles: vec![Role::Administrator],
                    all: vec!["metricas", "globales"],
                    response: vec![
                        "Desde el Dashboard Administrador, donde verás ventas, usuarios activos y desempeño por vendedor.",
                        "Entra en /dashboard/administrador/ desde el menú de tu cuenta.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Administrator],
                    any: vec!["reporte", "reportes", "reclamo", "reclamos"],
                    response: vec![
                        "En la sección 'Reportes' puedes revisar errores o reclamos y marcarlos como resueltos.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Administrator],
                    all: vec!["vendedores"],
                    any: vec!["notificacion", "notificaciones", "aviso", "avisos", "correo", "correos"],
                    response: vec![
                        "Desde el panel de administración puedes enviar avisos o correos masivos a todos los vendedores activos.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Seller],
                    all: vec!["stock", "critico"],
                    response: vec![
                        "Es una alerta automática cuando el inventario baja de 5 unidades para que repongas stock.",
                        "Revisa las alertas en tu Dashboard Vendedor.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Seller],
                    any: vec!["agrego", "agregar", "publicar", "publico"],
                    response: vec![
                        "En tu Dashboard Vendedor, entra a 'Mis productos' y presiona 'Agregar nuevo'.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Seller],
                    any: vec!["ventas"],
                    response: vec![
                        "En tu Dashboard puedes revisar tus ventas totales, productos más vendidos y métricas diarias.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Buyer],
                    any: vec!["seguimiento", "pedido", "pedidos"],
                    response: vec![
                        "Revisa el correo de confirmación o entra a 'Mis compras' en tu panel para ver el número de seguimiento.",
                    ],
                    ..Default::default()
                },
                Rule {
                    roles: vec![Role::Anonymous],
                    any: vec!["cuenta", "registro", "registrarme"],
                    response: vec![
                        "Debes registrarte o iniciar sesión para poder finalizar tus compras.",
                        "Encontrarás ambas opciones en el menú principal.",
                    ],
                    ..Default::default()
                },
            ],
            0.35,
        )
    }
}
