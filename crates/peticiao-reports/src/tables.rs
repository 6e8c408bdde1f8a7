//! Table names of the pre-aggregated views.

pub const LOCALITIES: &str = "cache_localidades";
pub const ERROR_HIERARCHY: &str = "cache_erros_hierarquicos";
pub const CLASSIFICATION_SUMMARY: &str = "cache_resumo_classificacoes";
pub const VERIFICATION_STATS: &str = "cache_verificacao_stats";
pub const DIVERGENCE_GROUPS: &str = "cache_divergencias_agrupadas";
pub const DIVERGENT_PROCESSES: &str = "cache_processos_divergentes";
pub const COMPETENCY_STATS: &str = "cache_stats_competencias";
